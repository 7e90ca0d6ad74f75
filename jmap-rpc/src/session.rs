// jmap-rpc/src/session.rs
use crate::blob::expand_template;
use crate::capability::{Capabilities, Capability, CapabilityRegistry};
use crate::error::{Error, Result};
use crate::types::{Id, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The server's description of itself, fetched from the session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Capability objects exactly as the server sent them.
    #[serde(rename = "capabilities")]
    pub raw_capabilities: HashMap<Uri, Value>,
    /// Decoded objects for the registered capabilities.
    #[serde(skip)]
    pub capabilities: Capabilities,
    pub accounts: HashMap<Id, Account>,
    /// The user's main account for each capability.
    pub primary_accounts: HashMap<Uri, Id>,
    #[serde(default)]
    pub username: String,
    pub api_url: String,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub upload_url: String,
    #[serde(default)]
    pub event_source_url: String,
    /// Changes whenever anything else in the session does.
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Key of this account in [`Session::accounts`].
    #[serde(skip)]
    pub id: Id,
    pub name: String,
    /// Belongs to the authenticated user rather than being shared.
    #[serde(default)]
    pub is_personal: bool,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(rename = "accountCapabilities", default)]
    pub raw_capabilities: HashMap<Uri, Value>,
    #[serde(skip)]
    pub capabilities: Capabilities,
}

impl Session {
    /// Decodes a session document and its registered capabilities.
    ///
    /// Fails if a primary account isn't listed in `accounts`, or doesn't
    /// advertise the capability it is primary for.
    pub fn from_slice(data: &[u8], registry: &CapabilityRegistry) -> Result<Self> {
        let mut session: Session = serde_json::from_slice(data)?;
        session.capabilities = registry.decode(&session.raw_capabilities)?;
        for (id, account) in session.accounts.iter_mut() {
            account.id = id.clone();
            account.capabilities = registry.decode(&account.raw_capabilities)?;
        }
        session.validate()?;
        Ok(session)
    }

    fn validate(&self) -> Result<()> {
        for (uri, id) in &self.primary_accounts {
            let account = self.accounts.get(id).ok_or_else(|| {
                Error::InvalidSession(format!("primary account '{id}' for {uri} is not listed"))
            })?;
            if !account.supports(uri.as_str()) {
                return Err(Error::InvalidSession(format!(
                    "primary account '{id}' doesn't advertise {uri}"
                )));
            }
        }
        Ok(())
    }

    /// Whether the server advertises `uri`, registered or not.
    pub fn supports(&self, uri: &str) -> bool {
        self.raw_capabilities.contains_key(uri)
    }

    pub fn capability<C: Capability>(&self) -> Option<&C> {
        self.capabilities.get::<C>()
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn primary_account(&self, uri: &str) -> Option<&Id> {
        self.primary_accounts.get(uri)
    }

    /// The primary account for `uri`, else the first personal account, else
    /// the first account. Ties are broken by id.
    pub fn default_account(&self, uri: &str) -> Option<&Id> {
        if let Some(id) = self.primary_account(uri) {
            return Some(id);
        }
        let mut accounts: Vec<&Account> = self.accounts.values().collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        accounts
            .iter()
            .copied()
            .find(|a| a.is_personal)
            .or_else(|| accounts.first().copied())
            .map(|a| &a.id)
    }

    /// Fails with [`Error::InvalidId`] before expanding anything if
    /// `account_id` isn't a valid ID.
    pub fn upload_url_for(&self, account_id: &str) -> Result<String> {
        Id::from(account_id).validate()?;
        Ok(expand_template(&self.upload_url, &[("accountId", account_id)]))
    }

    pub fn download_url_for(
        &self,
        account_id: &str,
        blob_id: &str,
        media_type: &str,
        name: &str,
    ) -> Result<String> {
        Id::from(account_id).validate()?;
        Id::from(blob_id).validate()?;
        Ok(expand_template(
            &self.download_url,
            &[
                ("accountId", account_id),
                ("blobId", blob_id),
                ("type", media_type),
                ("name", name),
            ],
        ))
    }
}

impl Account {
    pub fn supports(&self, uri: &str) -> bool {
        self.raw_capabilities.contains_key(uri)
    }

    pub fn capability<C: Capability>(&self) -> Option<&C> {
        self.capabilities.get::<C>()
    }
}
