use super::com_guard::ComGuard;
use super::helpers::{
    is_local_host, pwstr_to_string, quality_variant_to_string, resolve_clsid, variant_to_string,
};
use crate::client::{OpcClient, Property, SessionInfo};
use crate::errors::{OpcError, OpcResult};
use ::opc_da::client::v2::{Client, Server};
use ::opc_da::client::{ClientTrait, CommonTrait, ItemPropertiesTrait};
use std::mem::ManuallyDrop;
use windows::Win32::System::Com::{
    CLSCTX_REMOTE_SERVER, COSERVERINFO, CoCreateInstanceEx, MULTI_QI,
};
use windows::core::{GUID, HRESULT, IUnknown, Interface, PWSTR};

/// OPC DA property ID of the item quality.
const QUALITY_PROPERTY_ID: u32 = 3;

struct Session {
    server: Server,
    prog_id: String,
    host: String,
    connected_at: chrono::DateTime<chrono::Local>,
}

/// Concrete [`OpcClient`] for Windows OPC DA servers over COM/DCOM.
///
/// COM is initialized for the creating thread for the client's lifetime, so
/// the client must stay on that thread.
pub struct OpcDaClient {
    client_name: String,
    session: Option<Session>,
    _com: ComGuard,
}

impl OpcDaClient {
    /// Creates a client that announces itself to servers as `client_name`.
    pub fn new(client_name: &str) -> OpcResult<Self> {
        tracing::info!(client_name, "Initializing OpcDaClient...");
        let com = ComGuard::new()?;
        Ok(Self {
            client_name: client_name.to_string(),
            session: None,
            _com: com,
        })
    }

    fn session(&self) -> OpcResult<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| OpcError::InvalidState("no OPC session".into()))
    }
}

/// Instantiate the server on a remote host through DCOM.
fn create_remote_server(clsid: &GUID, host: &str) -> OpcResult<Server> {
    let mut host_wide: Vec<u16> = host.encode_utf16().chain(std::iter::once(0)).collect();
    let server_info = COSERVERINFO {
        dwReserved1: 0,
        pwszName: PWSTR(host_wide.as_mut_ptr()),
        pAuthInfo: std::ptr::null_mut(),
        dwReserved2: 0,
    };
    let mut results = [MULTI_QI {
        pIID: &IUnknown::IID,
        pItf: ManuallyDrop::new(None),
        hr: HRESULT(0),
    }];

    // SAFETY: `server_info` and `host_wide` outlive the call; `results`
    // is a valid one-element MULTI_QI array for the activation output.
    unsafe {
        CoCreateInstanceEx(
            clsid,
            None,
            CLSCTX_REMOTE_SERVER,
            Some(&raw const server_info),
            &mut results,
        )?;
    }
    results[0].hr.ok()?;

    // SAFETY: the interface slot is taken exactly once and never read again.
    let unknown = unsafe { ManuallyDrop::take(&mut results[0].pItf) }
        .ok_or_else(|| OpcError::Connection(format!("no interface returned by {host}")))?;
    Ok(Server::try_from(unknown.cast::<IUnknown>()?)?)
}

impl OpcClient for OpcDaClient {
    fn connect(&mut self, server: &str, host: &str) -> OpcResult<()> {
        if self.session.is_some() {
            return Err(OpcError::InvalidState("session already open".into()));
        }
        let clsid = resolve_clsid(server)?;

        let opc_server = if is_local_host(host) {
            // SAFETY: `opc_da::GUID` and `windows::core::GUID` are binary
            // compatible 128-bit structures with identical field layouts.
            let clsid = unsafe { std::mem::transmute_copy(&clsid) };
            Client.create_server(clsid, ::opc_da::def::ClassContext::All)?
        } else {
            create_remote_server(&clsid, host)?
        };

        if let Err(e) = opc_server.set_client_name(&self.client_name) {
            tracing::warn!(error = ?e, "server rejected client name");
        }

        tracing::info!(server, host, "OPC DA server instantiated");
        self.session = Some(Session {
            server: opc_server,
            prog_id: server.to_string(),
            host: host.to_string(),
            connected_at: chrono::Local::now(),
        });
        Ok(())
    }

    fn properties(&self, path: &str) -> OpcResult<Vec<Property>> {
        let session = self.session()?;
        let (ids, descriptions, _datatypes) = session.server.query_available_properties(path)?;
        let ids = ids.as_slice().to_vec();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let (values, errors) = session.server.get_item_properties(path, &ids)?;

        let mut properties = Vec::with_capacity(ids.len());
        for (((id, description), value), hr) in ids
            .iter()
            .zip(descriptions.as_slice())
            .zip(values.as_slice())
            .zip(errors.as_slice())
        {
            let name = pwstr_to_string(*description);
            if hr.is_err() {
                tracing::debug!(property = %name, code = ?hr, "property unavailable");
                continue;
            }
            let value = if *id == QUALITY_PROPERTY_ID {
                quality_variant_to_string(value)
            } else {
                variant_to_string(value)
            };
            properties.push(Property::new(*id, name, value));
        }
        Ok(properties)
    }

    fn close(&mut self) -> OpcResult<()> {
        if let Some(session) = self.session.take() {
            tracing::debug!(server = %session.prog_id, host = %session.host, "releasing OPC server");
        }
        Ok(())
    }

    fn info(&self) -> OpcResult<SessionInfo> {
        let session = self.session()?;
        let mut info = SessionInfo::default();
        info.push("Client Name", &self.client_name);
        info.push("OPC Server", &session.prog_id);
        info.push("OPC Host", &session.host);
        info.push(
            "Connected At",
            session.connected_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        info.push("COM Apartment", "MTA");
        Ok(info)
    }
}
