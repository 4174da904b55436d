/**
 * Room and User Directories
 *
 * Membership rules and user profiles live outside this service. The room
 * sessions consult them through two narrow traits:
 *
 * - `RoomDirectory::is_member` before a connection is registered, and before
 *   history is served over HTTP
 * - `UserDirectory::display_name` when announcing that a user joined
 *
 * `OpenRooms` and `AnonymousUsers` are the defaults when no external
 * directory is wired in. `StaticRooms` and `StaticUsers` hold fixed tables.
 */
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn is_member(&self, room_id: &str, user_id: &str) -> bool;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn display_name(&self, user_id: &str) -> Option<String>;
}

/// Every user may join every room
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRooms;

#[async_trait]
impl RoomDirectory for OpenRooms {
    async fn is_member(&self, _room_id: &str, _user_id: &str) -> bool {
        true
    }
}

/// Fixed membership table
#[derive(Debug, Clone, Default)]
pub struct StaticRooms {
    members: HashMap<String, HashSet<String>>,
}

impl StaticRooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, room_id: &str, user_id: &str) -> Self {
        self.members
            .entry(room_id.to_string())
            .or_default()
            .insert(user_id.to_string());
        self
    }
}

#[async_trait]
impl RoomDirectory for StaticRooms {
    async fn is_member(&self, room_id: &str, user_id: &str) -> bool {
        self.members
            .get(room_id)
            .is_some_and(|members| members.contains(user_id))
    }
}

/// No display metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousUsers;

#[async_trait]
impl UserDirectory for AnonymousUsers {
    async fn display_name(&self, _user_id: &str) -> Option<String> {
        None
    }
}

/// Fixed display-name table
#[derive(Debug, Clone, Default)]
pub struct StaticUsers {
    names: HashMap<String, String>,
}

impl StaticUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, user_id: &str, display_name: &str) -> Self {
        self.names.insert(user_id.to_string(), display_name.to_string());
        self
    }
}

#[async_trait]
impl UserDirectory for StaticUsers {
    async fn display_name(&self, user_id: &str) -> Option<String> {
        self.names.get(user_id).cloned()
    }
}
