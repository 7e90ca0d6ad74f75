// jmap-rpc/src/methods.rs
//! The standard `/get`, `/changes`, `/set`, `/query` and `/queryChanges`
//! methods of RFC 8620, generic over a [`DataType`].
use crate::argument::Argument;
use crate::error::SetError;
use crate::filter::Filter;
use crate::method::{Method, MethodRegistry};
use crate::types::{AddedItem, Comparator, Id, PatchObject};
use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// A record type served by the standard methods, eg `Mailbox`.
pub trait DataType: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// Prefix of the method names, eg `"Mailbox"` for `Mailbox/get`.
    const NAME: &'static str;
    /// Capabilities every method on this type requires.
    const CAPABILITIES: &'static [&'static str];
    /// Leaf condition of `/query` filters.
    type Filter: Serialize + fmt::Debug + Send + Sync;
}

/// Registers the five response types of `T` under their method names.
pub(crate) fn register<T: DataType>(methods: &MethodRegistry) {
    methods.register::<GetResponse<T>>(&format!("{}/get", T::NAME));
    methods.register::<ChangesResponse<T>>(&format!("{}/changes", T::NAME));
    methods.register::<SetResponse<T>>(&format!("{}/set", T::NAME));
    methods.register::<QueryResponse<T>>(&format!("{}/query", T::NAME));
    methods.register::<QueryChangesResponse<T>>(&format!("{}/queryChanges", T::NAME));
}

macro_rules! data_type_method {
    ($ty:ident, $suffix:literal) => {
        impl<T: DataType> Method for $ty<T> {
            fn name(&self) -> Cow<'static, str> {
                Cow::Owned(format!(concat!("{}/", $suffix), T::NAME))
            }

            fn requires(&self) -> &'static [&'static str] {
                T::CAPABILITIES
            }
        }
    };
}

data_type_method!(Get, "get");
data_type_method!(Changes, "changes");
data_type_method!(Set, "set");
data_type_method!(Query, "query");
data_type_method!(QueryChanges, "queryChanges");

/// `Foo/get`
#[derive(Debug, Clone)]
pub struct Get<T> {
    pub account_id: Id,
    /// `None` fetches every record, if the server allows it.
    pub ids: Option<Argument<Vec<Id>>>,
    /// `None` returns all properties.
    pub properties: Option<Argument<Vec<String>>>,
    _ph: PhantomData<fn() -> T>,
}

impl<T> Get<T> {
    pub fn new(account_id: Id) -> Self {
        Self {
            account_id,
            ids: None,
            properties: None,
            _ph: PhantomData,
        }
    }

    pub fn ids(mut self, ids: impl Into<Argument<Vec<Id>>>) -> Self {
        self.ids = Some(ids.into());
        self
    }

    pub fn properties(mut self, properties: impl Into<Argument<Vec<String>>>) -> Self {
        self.properties = Some(properties.into());
        self
    }
}

impl<T> Serialize for Get<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("accountId", &self.account_id)?;
        if let Some(ids) = &self.ids {
            ids.serialize_entry("ids", &mut map)?;
        }
        if let Some(properties) = &self.properties {
            properties.serialize_entry("properties", &mut map)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponse<T> {
    pub account_id: Id,
    pub state: String,
    pub list: Vec<T>,
    #[serde(default)]
    pub not_found: Vec<Id>,
}

/// `Foo/changes`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Changes<T> {
    pub account_id: Id,
    pub since_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_changes: Option<u64>,
    #[serde(skip)]
    _ph: PhantomData<fn() -> T>,
}

impl<T> Changes<T> {
    pub fn new(account_id: Id, since_state: impl Into<String>) -> Self {
        Self {
            account_id,
            since_state: since_state.into(),
            max_changes: None,
            _ph: PhantomData,
        }
    }

    pub fn max_changes(mut self, max_changes: u64) -> Self {
        self.max_changes = Some(max_changes);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesResponse<T> {
    pub account_id: Id,
    pub old_state: String,
    pub new_state: String,
    pub has_more_changes: bool,
    #[serde(default)]
    pub created: Vec<Id>,
    #[serde(default)]
    pub updated: Vec<Id>,
    #[serde(default)]
    pub destroyed: Vec<Id>,
    #[serde(skip)]
    _ph: PhantomData<fn() -> T>,
}

/// `Foo/set`
#[derive(Debug, Clone)]
pub struct Set<T> {
    pub account_id: Id,
    pub if_in_state: Option<String>,
    /// Keyed by client-chosen creation id.
    pub create: HashMap<String, T>,
    pub update: HashMap<Id, PatchObject>,
    pub destroy: Option<Argument<Vec<Id>>>,
}

impl<T> Set<T> {
    pub fn new(account_id: Id) -> Self {
        Self {
            account_id,
            if_in_state: None,
            create: HashMap::new(),
            update: HashMap::new(),
            destroy: None,
        }
    }

    pub fn if_in_state(mut self, state: impl Into<String>) -> Self {
        self.if_in_state = Some(state.into());
        self
    }

    pub fn create(mut self, creation_id: impl Into<String>, record: T) -> Self {
        self.create.insert(creation_id.into(), record);
        self
    }

    pub fn update(mut self, id: Id, patch: PatchObject) -> Self {
        self.update.insert(id, patch);
        self
    }

    pub fn destroy(mut self, ids: impl Into<Argument<Vec<Id>>>) -> Self {
        self.destroy = Some(ids.into());
        self
    }
}

impl<T: Serialize> Serialize for Set<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("accountId", &self.account_id)?;
        if let Some(state) = &self.if_in_state {
            map.serialize_entry("ifInState", state)?;
        }
        if !self.create.is_empty() {
            map.serialize_entry("create", &self.create)?;
        }
        if !self.update.is_empty() {
            map.serialize_entry("update", &self.update)?;
        }
        if let Some(destroy) = &self.destroy {
            destroy.serialize_entry("destroy", &mut map)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetResponse<T> {
    pub account_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_state: Option<String>,
    pub new_state: String,
    /// Server-set properties of each created record, by creation id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<HashMap<String, Map<String, Value>>>,
    /// Properties changed other than those in the patch, or `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<HashMap<Id, Option<Map<String, Value>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destroyed: Option<Vec<Id>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_created: Option<HashMap<String, SetError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_updated: Option<HashMap<Id, SetError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_destroyed: Option<HashMap<Id, SetError>>,
    #[serde(skip)]
    _ph: PhantomData<fn() -> T>,
}

impl<T> SetResponse<T> {
    /// Server id of the record created as `creation_id`.
    pub fn created_id(&self, creation_id: &str) -> Option<Id> {
        let record = self.created.as_ref()?.get(creation_id)?;
        record
            .get("id")
            .and_then(Value::as_str)
            .map(Id::from)
    }
}

/// `Foo/query`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct Query<T: DataType> {
    pub account_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter<T::Filter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<Comparator>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculate_total: Option<bool>,
}

impl<T: DataType> Query<T> {
    pub fn new(account_id: Id) -> Self {
        Self {
            account_id,
            filter: None,
            sort: None,
            position: None,
            anchor: None,
            anchor_offset: None,
            limit: None,
            calculate_total: None,
        }
    }

    pub fn filter(mut self, filter: impl Into<Filter<T::Filter>>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sort(mut self, sort: impl IntoIterator<Item = Comparator>) -> Self {
        self.sort = Some(sort.into_iter().collect());
        self
    }

    pub fn position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn anchor(mut self, anchor: Id, offset: i64) -> Self {
        self.anchor = Some(anchor);
        self.anchor_offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn calculate_total(mut self, calculate_total: bool) -> Self {
        self.calculate_total = Some(calculate_total);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse<T> {
    pub account_id: Id,
    pub query_state: String,
    pub can_calculate_changes: bool,
    pub position: u64,
    pub ids: Vec<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip)]
    _ph: PhantomData<fn() -> T>,
}

/// `Foo/queryChanges`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct QueryChanges<T: DataType> {
    pub account_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter<T::Filter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<Comparator>>,
    pub since_query_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_changes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_to_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculate_total: Option<bool>,
}

impl<T: DataType> QueryChanges<T> {
    /// Use the same filter and sort as the query being updated.
    pub fn new(query: &Query<T>, since_query_state: impl Into<String>) -> Self
    where
        T::Filter: Clone,
    {
        Self {
            account_id: query.account_id.clone(),
            filter: query.filter.clone(),
            sort: query.sort.clone(),
            since_query_state: since_query_state.into(),
            max_changes: None,
            up_to_id: None,
            calculate_total: None,
        }
    }

    pub fn max_changes(mut self, max_changes: u64) -> Self {
        self.max_changes = Some(max_changes);
        self
    }

    pub fn up_to_id(mut self, id: Id) -> Self {
        self.up_to_id = Some(id);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryChangesResponse<T> {
    pub account_id: Id,
    pub old_query_state: String,
    pub new_query_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default)]
    pub removed: Vec<Id>,
    #[serde(default)]
    pub added: Vec<AddedItem>,
    #[serde(skip)]
    _ph: PhantomData<fn() -> T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_types;
    use crate::registry::Registry;
    use crate::request::Request;
    use crate::response::Response;
    use serde_json::json;

    const NOTES: &str = "urn:example:notes";

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<Id>,
        title: String,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct NoteFilter {
        title_contains: String,
    }

    impl DataType for Note {
        const NAME: &'static str = "Note";
        const CAPABILITIES: &'static [&'static str] = &[crate::core::URI, NOTES];
        type Filter = NoteFilter;
    }

    fn account() -> Id {
        Id::from("A1")
    }

    #[test]
    fn test_get_with_reference() {
        let mut req = Request::new();
        let query = req
            .invoke(&Query::<Note>::new(account()).limit(10))
            .unwrap();
        let ids = req.reference(&query, "/ids").unwrap();
        let get = req.invoke(&Get::<Note>::new(account()).ids(ids)).unwrap();

        assert_eq!(get, "1");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["using"], json!([crate::core::URI, NOTES]));
        assert_eq!(
            value["methodCalls"][1],
            json!(["Note/get", {
                "accountId": "A1",
                "#ids": {"resultOf": "0", "name": "Note/query", "path": "/ids"}
            }, "1"])
        );
    }

    #[test]
    fn test_get_all() {
        let get = Get::<Note>::new(account()).properties(vec!["title".to_string()]);
        assert_eq!(get.name(), "Note/get");
        assert_eq!(
            serde_json::to_value(&get).unwrap(),
            json!({"accountId": "A1", "properties": ["title"]})
        );
    }

    #[test]
    fn test_set_serialization() {
        let mut patch = PatchObject::new();
        patch.insert("title".into(), json!("renamed"));
        let set = Set::new(account())
            .if_in_state("s1")
            .create(
                "k1",
                Note {
                    id: None,
                    title: "hello".into(),
                },
            )
            .update(Id::from("n2"), patch)
            .destroy(vec![Id::from("n3")]);

        assert_eq!(set.name(), "Note/set");
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!({
                "accountId": "A1",
                "ifInState": "s1",
                "create": {"k1": {"title": "hello"}},
                "update": {"n2": {"title": "renamed"}},
                "destroy": ["n3"]
            })
        );
    }

    #[test]
    fn test_query_serialization() {
        let query = Query::<Note>::new(account())
            .filter(
                Filter::condition(NoteFilter {
                    title_contains: "a".into(),
                }) | Filter::condition(NoteFilter {
                    title_contains: "b".into(),
                }),
            )
            .sort([Comparator::new("title")])
            .calculate_total(true);

        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "accountId": "A1",
                "filter": {"operator": "OR", "conditions": [
                    {"titleContains": "a"},
                    {"titleContains": "b"}
                ]},
                "sort": [{"property": "title", "isAscending": true}],
                "calculateTotal": true
            })
        );

        let changes = QueryChanges::new(&query, "q1").max_changes(5);
        assert_eq!(changes.name(), "Note/queryChanges");
        let value = serde_json::to_value(&changes).unwrap();
        assert_eq!(value["sinceQueryState"], "q1");
        assert_eq!(value["filter"]["operator"], "OR");
    }

    #[test]
    fn test_decode_registered_responses() {
        let registry = Registry::default();
        registry.register_data_type::<Note>();

        let data = json!({
            "sessionState": "s",
            "methodResponses": [
                ["Note/query", {
                    "accountId": "A1", "queryState": "q1", "canCalculateChanges": true,
                    "position": 0, "ids": ["n1"], "total": 1
                }, "0"],
                ["Note/get", {
                    "accountId": "A1", "state": "s9",
                    "list": [{"id": "n1", "title": "hello"}], "notFound": []
                }, "1"],
                ["Note/set", {
                    "accountId": "A1", "newState": "s10",
                    "created": {"k1": {"id": "n5"}},
                    "notDestroyed": {"n3": {"type": "notFound"}}
                }, "2"],
                ["Note/changes", {
                    "accountId": "A1", "oldState": "s9", "newState": "s10",
                    "hasMoreChanges": false, "created": ["n5"]
                }, "3"],
                ["Note/queryChanges", {
                    "accountId": "A1", "oldQueryState": "q1", "newQueryState": "q2",
                    "removed": [], "added": [{"id": "n5", "index": 0}]
                }, "4"]
            ]
        });
        let resp =
            Response::from_slice(&serde_json::to_vec(&data).unwrap(), registry.methods()).unwrap();

        let query = resp.get::<QueryResponse<Note>>("0").unwrap();
        assert_eq!(query.ids, vec![Id::from("n1")]);
        assert_eq!(query.total, Some(1));

        let get = resp.get::<GetResponse<Note>>("1").unwrap();
        assert_eq!(get.list[0].title, "hello");

        let set = resp.get::<SetResponse<Note>>("2").unwrap();
        assert_eq!(set.created_id("k1"), Some(Id::from("n5")));
        let not_destroyed = set.not_destroyed.as_ref().unwrap();
        assert!(not_destroyed["n3"].is(error_types::NOT_FOUND));

        let changes = resp.get::<ChangesResponse<Note>>("3").unwrap();
        assert_eq!(changes.created, vec![Id::from("n5")]);
        assert!(changes.destroyed.is_empty());

        let query_changes = resp.get::<QueryChangesResponse<Note>>("4").unwrap();
        assert_eq!(query_changes.added[0].index, 0);
    }
}
