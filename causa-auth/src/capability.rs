//! The fixed set of delegate permissions.

use std::collections::BTreeSet;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::AuthError;

/// A single named permission flag. Wire names are snake_case
/// (`listar_clientes`, `editar_processo`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(EnumIter, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    // Clients
    /// Can register new clients.
    CadastrarCliente,
    /// Can edit client records.
    EditarCliente,
    /// Can list clients.
    ListarClientes,
    /// Can open a client record.
    VisualizarCliente,
    /// Can delete clients.
    ExcluirCliente,
    /// Can export the client list.
    ExportarClientes,

    // Cases
    CadastrarProcesso,
    EditarProcesso,
    ListarProcessos,
    VisualizarProcesso,
    ExcluirProcesso,
    /// Can archive and unarchive cases.
    AtualizarStatusProcesso,

    // Agenda
    VerAgenda,
    AdicionarEvento,
    EditarEvento,
    ExcluirEvento,
    EditarAudiencias,
    CompartilharAgenda,

    // Documents
    AcessarDocumentos,
    UploadDocumento,
    DownloadDocumento,
    ExcluirDocumento,
    VisualizarDocumentos,

    // System
    /// Can see the owner's delegates and their permissions.
    GerenciarColaboradores,
    ConfigurarLayout,
    VisualizarRelatorios,

    // Billing
    /// Can see and manage fees.
    AcessarFinanceiro,
}

impl Capability {
    /// Value a fresh delegate starts with: read access to clients plus
    /// client registration, nothing else.
    pub const fn default_value(self) -> bool {
        matches!(
            self,
            Self::CadastrarCliente | Self::ListarClientes | Self::VisualizarCliente
        )
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Parse a wire name. Unknown names are an error, never a silent `false`.
    pub fn parse(name: &str) -> Result<Self, AuthError> {
        name.parse::<Self>()
            .map_err(|_| AuthError::UnknownCapability(name.to_string()))
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delegate's permission matrix. Only granted flags are stored; every
/// capability not in the set is `false`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapabilitySet {
    granted: BTreeSet<Capability>,
}

impl CapabilitySet {
    /// Nothing granted.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn defaults() -> Self {
        Self {
            granted: Capability::iter().filter(|c| c.default_value()).collect(),
        }
    }

    pub fn all() -> Self {
        Self {
            granted: Capability::iter().collect(),
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }

    pub fn set(&mut self, capability: Capability, value: bool) {
        if value {
            self.granted.insert(capability);
        } else {
            self.granted.remove(&capability);
        }
    }

    pub fn with(mut self, capability: Capability, value: bool) -> Self {
        self.set(capability, value);
        self
    }

    pub fn granted(&self) -> impl Iterator<Item = Capability> + '_ {
        self.granted.iter().copied()
    }

    /// Apply `{"flag": bool, ...}`. The patch is checked in full before
    /// anything changes, so a bad key leaves the set untouched.
    pub fn apply_patch(&mut self, patch: &Map<String, Value>) -> Result<(), AuthError> {
        let mut changes = Vec::with_capacity(patch.len());
        for (name, value) in patch {
            let capability = Capability::parse(name)?;
            let flag = value
                .as_bool()
                .ok_or_else(|| AuthError::InvalidFlag(name.clone()))?;
            changes.push((capability, flag));
        }
        for (capability, flag) in changes {
            self.set(capability, flag);
        }
        Ok(())
    }

    /// Every capability with its current value, in declaration order.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = Capability::iter()
            .map(|c| (c.as_str().to_string(), Value::Bool(self.allows(c))))
            .collect();
        Value::Object(map)
    }
}

impl Serialize for CapabilitySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Capability::iter().len()))?;
        for capability in Capability::iter() {
            map.serialize_entry(capability.as_str(), &self.allows(capability))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_names_are_snake_case() {
        assert_eq!(Capability::ListarClientes.as_str(), "listar_clientes");
        assert_eq!(
            Capability::parse("atualizar_status_processo").unwrap(),
            Capability::AtualizarStatusProcesso
        );
        assert_eq!(Capability::iter().count(), 27);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            Capability::parse("apagar_tudo"),
            Err(AuthError::UnknownCapability("apagar_tudo".into()))
        );
    }

    #[test]
    fn defaults_grant_client_read_and_register_only() {
        let set = CapabilitySet::defaults();
        let granted: Vec<_> = set.granted().collect();
        assert_eq!(
            granted,
            vec![
                Capability::CadastrarCliente,
                Capability::ListarClientes,
                Capability::VisualizarCliente
            ]
        );
        assert!(!set.allows(Capability::EditarProcesso));
        assert!(!set.allows(Capability::GerenciarColaboradores));
    }

    #[test]
    fn patch_is_all_or_nothing() {
        let mut set = CapabilitySet::defaults();
        let bad = json!({"editar_cliente": true, "nao_existe": true});
        assert!(set.apply_patch(bad.as_object().unwrap()).is_err());
        assert!(!set.allows(Capability::EditarCliente));

        let not_bool = json!({"editar_cliente": "yes"});
        assert_eq!(
            set.apply_patch(not_bool.as_object().unwrap()),
            Err(AuthError::InvalidFlag("editar_cliente".into()))
        );

        let good = json!({"editar_cliente": true, "listar_clientes": false});
        set.apply_patch(good.as_object().unwrap()).unwrap();
        assert!(set.allows(Capability::EditarCliente));
        assert!(!set.allows(Capability::ListarClientes));
    }

    #[test]
    fn serializes_every_flag() {
        let value = serde_json::to_value(CapabilitySet::defaults()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 27);
        assert_eq!(obj["listar_clientes"], json!(true));
        assert_eq!(obj["acessar_financeiro"], json!(false));
        assert_eq!(value, CapabilitySet::defaults().to_json());
    }
}
