use drm_core::{KID_LEN, Kid};

/**
    Protobuf tag (field 2, length-delimited) and length (16) that introduce
    a key ID inside Widevine PSSH data.
*/
pub const KEY_ID_FIELD_MARKER: [u8; 2] = [0x12, 0x10];

/**
    Fill byte of a key ID slot that packagers leave for the player to
    complete from `cenc:default_KID`. This is the agreed placeholder
    convention only; `0xFF` carries no meaning anywhere else.
*/
pub const PLACEHOLDER_KID_BYTE: u8 = 0xFF;

/**
    Marker plus slot. Scanning stops at `len - 18`.
*/
const FIELD_LEN: usize = KEY_ID_FIELD_MARKER.len() + KID_LEN;

/**
    Offset of the 16-byte key ID slot following the first
    [`KEY_ID_FIELD_MARKER`] in `pssh`.

    Only markers with a complete slot behind them are considered, so short
    buffers simply report no slot.
*/
pub fn find_key_id_slot(pssh: &[u8]) -> Option<usize> {
    pssh.windows(FIELD_LEN)
        .position(|field| field[..2] == KEY_ID_FIELD_MARKER)
        .map(|pos| pos + KEY_ID_FIELD_MARKER.len())
}

/**
    Whether the first key ID slot holds the placeholder.
*/
pub fn has_placeholder_kid(pssh: &[u8]) -> bool {
    find_key_id_slot(pssh).is_some_and(|slot| {
        pssh[slot..slot + KID_LEN]
            .iter()
            .all(|&b| b == PLACEHOLDER_KID_BYTE)
    })
}

/**
    Write `kid` into the first key ID slot of `pssh` if that slot holds the
    placeholder. Returns whether the buffer was modified.

    A slot with a real key ID, or no slot at all, leaves `pssh` untouched.
    Later markers are never examined.
*/
pub fn fill_placeholder_kid(pssh: &mut [u8], kid: &Kid) -> bool {
    let Some(start) = find_key_id_slot(pssh) else {
        return false;
    };
    let slot = &mut pssh[start..start + KID_LEN];
    if !slot.iter().all(|&b| b == PLACEHOLDER_KID_BYTE) {
        return false;
    }
    slot.copy_from_slice(kid);
    true
}
