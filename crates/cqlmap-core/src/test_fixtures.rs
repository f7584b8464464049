//! Entities shared by unit and integration tests.

use crate::{
    config::EntityConfig,
    model::{EmbeddedIdProperties, EntityMeta, KeyComponent, PropertyMeta},
    value::ColumnType,
};
use std::collections::{BTreeMap, BTreeSet};

///
/// User
///
/// Simple id, two plain columns.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub age: Option<i64>,
}

#[must_use]
pub fn user_meta() -> EntityMeta<User> {
    EntityMeta::builder("app::model::User")
        .config(EntityConfig::default().table("users"))
        .id(PropertyMeta::id("id", ColumnType::BigInt, field_accessor!(User, id)))
        .property(PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name)))
        .property(PropertyMeta::simple("age", ColumnType::BigInt, field_accessor!(User, age)))
        .build()
        .unwrap()
}

///
/// Event
///
/// Compound id: partition `id`, clustering `a` (descending) then `b`.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    pub id: i64,
    pub a: i32,
    pub b: String,
    pub region: Option<String>,
    pub payload: Option<String>,
}

#[must_use]
pub fn event_meta() -> EntityMeta<Event> {
    let key = EmbeddedIdProperties::new()
        .partition(KeyComponent::new("id", ColumnType::BigInt, field_accessor!(Event, id)))
        .clustering(KeyComponent::new("a", ColumnType::Int, field_accessor!(Event, a)).reversed())
        .clustering(KeyComponent::new("b", ColumnType::Text, field_accessor!(Event, b)));

    EntityMeta::builder("app::model::Event")
        .config(EntityConfig::default().table("events"))
        .id(PropertyMeta::embedded_id("key", key))
        .property(
            PropertyMeta::simple("region", ColumnType::Text, field_accessor!(Event, region))
                .static_column(),
        )
        .property(
            PropertyMeta::simple("payload", ColumnType::Text, field_accessor!(Event, payload))
                .indexed(),
        )
        .build()
        .unwrap()
}

///
/// Profile
///
/// Collection columns plus a counter kept in the shared counter table.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub version: Option<i64>,
    pub history: Vec<String>,
    pub tags: BTreeSet<String>,
    pub prefs: BTreeMap<String, String>,
    pub likes: i64,
}

#[must_use]
pub fn profile_meta() -> EntityMeta<Profile> {
    EntityMeta::builder("app::model::Profile")
        .config(EntityConfig::default().table("profiles").ttl(3600))
        .id(PropertyMeta::id("id", ColumnType::BigInt, field_accessor!(Profile, id)))
        .property(PropertyMeta::simple(
            "version",
            ColumnType::BigInt,
            field_accessor!(Profile, version),
        ))
        .property(PropertyMeta::list(
            "history",
            ColumnType::Text,
            field_accessor!(Profile, history),
        ))
        .property(PropertyMeta::set("tags", ColumnType::Text, field_accessor!(Profile, tags)))
        .property(PropertyMeta::map(
            "prefs",
            ColumnType::Text,
            ColumnType::Text,
            field_accessor!(Profile, prefs),
        ))
        .property(PropertyMeta::counter("likes", field_accessor!(Profile, likes)))
        .build()
        .unwrap()
}

///
/// PageHits
///
/// Clustered counter entity: the counter lives in the entity table.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageHits {
    pub site: String,
    pub page: String,
    pub hits: i64,
}

#[must_use]
pub fn page_hits_meta() -> EntityMeta<PageHits> {
    let key = EmbeddedIdProperties::new()
        .partition(KeyComponent::new("site", ColumnType::Text, field_accessor!(PageHits, site)))
        .clustering(KeyComponent::new("page", ColumnType::Text, field_accessor!(PageHits, page)));

    EntityMeta::builder("app::model::PageHits")
        .id(PropertyMeta::embedded_id("key", key))
        .property(PropertyMeta::counter("hits", field_accessor!(PageHits, hits)))
        .build()
        .unwrap()
}
