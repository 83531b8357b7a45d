//! One-off connectivity check: connect, read known points, close.

use anyhow::{Context, Result};
use opc_scanner::{OpcClient, OpcScanner, ReadOutcome, friendly_hint};
use std::io::Write;

/// Points read when none are given on the command line.
pub const DEFAULT_PATHS: &[&str] = &["LIC_572989/AO1/BLOCK_ERR.CV"];

/// Result of reading one path during a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReading {
    pub path: String,
    pub outcome: ReadOutcome,
}

/// Connects `scanner`, reads every path and reports to `out`.
///
/// The session is closed before returning, whether or not the connect or
/// any read failed. Connection failures are reported and returned.
pub fn prove_connectivity<C: OpcClient, W: Write>(
    scanner: &mut OpcScanner<C>,
    paths: &[String],
    max_retries: u32,
    out: &mut W,
) -> Result<Vec<PathReading>> {
    let readings = read_paths(scanner, paths, max_retries, out);

    if let Err(e) = scanner.close() {
        tracing::warn!(error = %e, "close failed");
        writeln!(out, "Warning: could not close session: {e}")?;
    }

    readings
}

fn read_paths<C: OpcClient, W: Write>(
    scanner: &mut OpcScanner<C>,
    paths: &[String],
    max_retries: u32,
    out: &mut W,
) -> Result<Vec<PathReading>> {
    match scanner.connect() {
        Ok(info) => {
            writeln!(
                out,
                "Achieved successful connection to {} on {}",
                scanner.server(),
                scanner.host()
            )?;
            write!(out, "{info}")?;
        }
        Err(e) => {
            writeln!(out, "Could not connect: {e}")?;
            if let Some(hint) = friendly_hint(&e) {
                writeln!(out, "Hint: {hint}")?;
            }
            return Err(e).with_context(|| {
                format!("connecting to {} on {}", scanner.server(), scanner.host())
            });
        }
    }

    let mut readings = Vec::with_capacity(paths.len());
    for path in paths {
        let outcome = scanner.read_value(path, max_retries);
        writeln!(out, "{path} = {outcome}")?;
        if outcome.is_value() {
            tracing::info!(path = %path, value = %outcome, "read ok");
        } else {
            tracing::warn!(path = %path, outcome = %outcome, "read failed");
        }
        readings.push(PathReading {
            path: path.clone(),
            outcome,
        });
    }
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use opc_scanner::{DOES_NOT_EXIST, MockOpcClient, OpcError, Property, SessionInfo};

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_reads_each_path_and_closes() {
        let mut mock = MockOpcClient::new();
        mock.expect_connect()
            .with(eq("OPC.DeltaV.1"), eq("10.4.0.22"))
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_info().returning(|| {
            let mut info = SessionInfo::default();
            info.push("OPC Host", "10.4.0.22");
            Ok(info)
        });
        mock.expect_properties()
            .with(eq("FIC_101/PV.CV"))
            .returning(|_| {
                Ok(vec![
                    Property::new(3, "Item Quality", "Good"),
                    Property::new(2, "Item Value", "17.25"),
                ])
            });
        mock.expect_properties()
            .with(eq("MISSING/PV.CV"))
            .returning(|_| Err(OpcError::ole(0xC004_0007, "unknown item")));
        mock.expect_close().times(1).returning(|| Ok(()));

        let mut scanner = OpcScanner::new(mock, "10.4.0.22");
        let mut out = Vec::new();
        let readings = prove_connectivity(
            &mut scanner,
            &paths(&["FIC_101/PV.CV", "MISSING/PV.CV"]),
            3,
            &mut out,
        )
        .unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].outcome, ReadOutcome::Value("17.25".into()));
        assert_eq!(
            readings[1].outcome,
            ReadOutcome::Failed(DOES_NOT_EXIST.into())
        );
        assert!(!scanner.is_connected());

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Achieved successful connection to OPC.DeltaV.1 on 10.4.0.22"));
        assert!(text.contains("FIC_101/PV.CV = 17.25"));
        assert!(text.contains("MISSING/PV.CV = DoesNotExist"));
    }

    #[test]
    fn test_reads_proceed_when_session_info_fails() {
        let mut mock = MockOpcClient::new();
        mock.expect_connect().times(1).returning(|_, _| Ok(()));
        mock.expect_info()
            .returning(|| Err(OpcError::Internal("info broke".into())));
        mock.expect_properties().times(1).returning(|_| {
            Ok(vec![
                Property::new(3, "Item Quality", "Good"),
                Property::new(2, "Item Value", "0"),
            ])
        });
        mock.expect_close().times(1).returning(|| Ok(()));

        let mut scanner = OpcScanner::new(mock, "10.4.0.21");
        let mut out = Vec::new();
        let readings =
            prove_connectivity(&mut scanner, &paths(DEFAULT_PATHS), 5, &mut out).unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].outcome, ReadOutcome::Value("0".into()));

        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Could not connect"));
        assert!(text.contains("LIC_572989/AO1/BLOCK_ERR.CV = 0"));
    }

    #[test]
    fn test_connect_failure_is_reported_and_returned() {
        let mut mock = MockOpcClient::new();
        mock.expect_connect()
            .times(1)
            .returning(|_, _| Err(OpcError::ole(0x8007_0005, "Access is denied.")));
        mock.expect_properties().never();
        mock.expect_close().never();

        let mut scanner = OpcScanner::new(mock, "10.4.0.21");
        let mut out = Vec::new();
        let err = prove_connectivity(&mut scanner, &paths(DEFAULT_PATHS), 500, &mut out)
            .unwrap_err();

        assert!(err.to_string().contains("connecting to OPC.DeltaV.1 on 10.4.0.21"));
        let source = err.downcast_ref::<OpcError>().unwrap();
        assert!(matches!(source, OpcError::Ole { code: 0x8007_0005, .. }));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Could not connect: OLE error 0x80070005"));
        assert!(text.contains("Hint: Access denied"));
    }

    #[test]
    fn test_close_failure_is_reported_not_fatal() {
        let mut mock = MockOpcClient::new();
        mock.expect_connect().returning(|_, _| Ok(()));
        mock.expect_info().returning(|| Ok(SessionInfo::default()));
        mock.expect_close()
            .times(1)
            .returning(|| Err(OpcError::Internal("server gone".into())));

        let mut scanner = OpcScanner::new(mock, "localhost");
        let mut out = Vec::new();
        let readings = prove_connectivity(&mut scanner, &[], 5, &mut out).unwrap();

        assert!(readings.is_empty());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Warning: could not close session: Internal error: server gone"));
    }
}
