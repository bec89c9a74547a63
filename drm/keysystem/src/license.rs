use std::collections::BTreeMap;

use tracing::debug;

use crate::system::KeySystem;

/**
    Everything needed to send one license request, without sending it.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub with_credentials: bool,
}

impl LicenseRequest {
    /**
        Shape a CDM message into a license request for `key_system`.

        The URL is the configured `serverURL`, falling back to one embedded
        in `init_data`. Configured `httpRequestHeaders` override the headers
        derived from the message. Returns `None` when there is no URL or the
        message yields no request body.
    */
    pub fn prepare(
        key_system: &dyn KeySystem,
        message: &[u8],
        init_data: Option<&[u8]>,
    ) -> Option<Self> {
        let data = key_system.protection_data();

        let url = data
            .and_then(|d| d.server_url())
            .map(str::to_owned)
            .or_else(|| init_data.and_then(|i| key_system.license_server_url_from_init_data(i)));
        let Some(url) = url else {
            debug!(key_system = key_system.system_string(), "no license server URL");
            return None;
        };

        let body = key_system.license_request_from_message(message)?;

        let mut headers = key_system
            .request_headers_from_message(message)
            .unwrap_or_default();
        if let Some(data) = data {
            headers.extend(
                data.http_request_headers
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
        }

        Some(Self {
            url,
            headers,
            body,
            with_credentials: data.is_some_and(|d| d.with_credentials),
        })
    }
}
