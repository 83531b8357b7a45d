use crate::errors::{OpcError, OpcResult};
use windows::Win32::System::Com::CLSIDFromProgID;
use windows::Win32::System::Ole::{SafeArrayGetDim, SafeArrayGetLBound, SafeArrayGetUBound};
use windows::Win32::System::Variant::VARIANT;
use windows::core::{GUID, PCWSTR, PWSTR};

impl From<windows::core::Error> for OpcError {
    #[allow(clippy::cast_sign_loss)]
    fn from(err: windows::core::Error) -> Self {
        Self::Ole {
            code: err.code().0 as u32,
            message: err.message().to_string(),
        }
    }
}

/// Returns `true` when `host` names the local machine.
pub fn is_local_host(host: &str) -> bool {
    let host = host.trim();
    host.is_empty()
        || host.eq_ignore_ascii_case("localhost")
        || host == "127.0.0.1"
        || host == "::1"
        || host == "."
        || std::env::var("COMPUTERNAME").is_ok_and(|name| name.eq_ignore_ascii_case(host))
}

/// Resolve an OPC DA server `ProgID` to its `CLSID` via the local registry.
pub fn resolve_clsid(prog_id: &str) -> OpcResult<GUID> {
    let wide: Vec<u16> = prog_id.encode_utf16().chain(std::iter::once(0)).collect();
    // SAFETY: `wide` is null-terminated and lives until the end of this
    // scope, so the PCWSTR pointer is valid for the duration of the call.
    unsafe { CLSIDFromProgID(PCWSTR(wide.as_ptr())) }.map_err(|e| {
        tracing::error!(error = ?e, prog_id, "ProgID lookup failed");
        OpcError::Connection(format!("Failed to resolve ProgID '{prog_id}' to CLSID: {e}"))
    })
}

/// Copy a server-allocated wide string, returning an empty string for null.
pub fn pwstr_to_string(value: PWSTR) -> String {
    if value.is_null() {
        return String::new();
    }
    // SAFETY: non-null PWSTRs handed back by the server are null-terminated.
    unsafe { value.to_string() }.unwrap_or_default()
}

/// Map an OPC quality code to a human-readable label.
pub fn quality_to_string(quality: u16) -> String {
    match quality & 0xC0 {
        0xC0 => "Good".to_string(),
        0x00 => "Bad".to_string(),
        0x40 => "Uncertain".to_string(),
        _ => format!("Unknown(0x{quality:04X})"),
    }
}

/// Render the "Item Quality" property, which servers report as an integer code.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn quality_variant_to_string(variant: &VARIANT) -> String {
    // SAFETY: the `vt` discriminant selects the active union arm.
    unsafe {
        let inner = &variant.Anonymous.Anonymous;
        match inner.vt.0 {
            2 => quality_to_string(inner.Anonymous.iVal as u16),  // VT_I2
            3 => quality_to_string(inner.Anonymous.lVal as u16),  // VT_I4
            18 => quality_to_string(inner.Anonymous.uiVal),       // VT_UI2
            19 => quality_to_string(inner.Anonymous.ulVal as u16), // VT_UI4
            _ => variant_to_string(variant),
        }
    }
}

/// Convert a property VARIANT to plain text.
pub fn variant_to_string(variant: &VARIANT) -> String {
    // SAFETY: the VARIANT was produced by COM (`GetItemProperties`), so the
    // `vt` discriminant correctly identifies which union arm is active.
    unsafe {
        let vt = variant.Anonymous.Anonymous.vt;
        let base_type = vt.0 & 0x0FFF;
        let is_array = (vt.0 & 0x2000) != 0;

        if is_array {
            let parray = variant.Anonymous.Anonymous.Anonymous.parray;
            if parray.is_null() {
                return "Array[?]".to_string();
            }
            let dims = SafeArrayGetDim(parray);
            if dims == 0 {
                return "Array[0]".to_string();
            }
            if dims == 1 {
                let lb = SafeArrayGetLBound(parray, 1).unwrap_or(0);
                let ub = SafeArrayGetUBound(parray, 1).unwrap_or(-1);
                let count = (ub - lb + 1).max(0);
                return format!(
                    "Array[{count}] ({:?})",
                    windows::Win32::System::Variant::VARENUM(base_type)
                );
            }
            return format!("Array[{dims}D]");
        }

        let value = &variant.Anonymous.Anonymous.Anonymous;
        match vt.0 {
            0 => "Empty".to_string(),
            1 => "None".to_string(),
            2 => value.iVal.to_string(),
            3 => value.lVal.to_string(),
            4 => value.fltVal.to_string(),
            5 => value.dblVal.to_string(),
            6 => {
                // VT_CY: 64-bit fixed point scaled by 10,000
                let raw = value.cyVal.int64;
                let whole = raw / 10_000;
                let frac = (raw % 10_000).unsigned_abs();
                let sign = if raw < 0 && whole == 0 { "-" } else { "" };
                format!("{sign}{whole}.{frac:04}")
            }
            7 => ole_date_to_string(value.date),
            8 => value.bstrVal.to_string(),
            11 => (value.boolVal.0 != 0).to_string(),
            #[allow(clippy::cast_possible_wrap)]
            16 => (value.bVal as i8).to_string(),
            17 => value.bVal.to_string(),
            18 => value.uiVal.to_string(),
            19 => value.ulVal.to_string(),
            20 => value.llVal.to_string(),
            21 => value.ullVal.to_string(),
            _ => format!("(VT {vt:?})"),
        }
    }
}

/// Convert an OLE Automation date (days since 1899-12-30) to local time text.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]
fn ole_date_to_string(ole_date: f64) -> String {
    const OLE_EPOCH_DAYS: i64 = 25569; // 1899-12-30 to 1970-01-01
    let total_secs = (ole_date - OLE_EPOCH_DAYS as f64) * 86400.0;
    chrono::DateTime::from_timestamp(total_secs as i64, 0).map_or_else(
        || format!("{ole_date:.6}"),
        |utc| {
            utc.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}
