/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::actor::Entity;
use crate::common::{ActorId, ActorRef};

/// Every reactor that has not terminated, by id, plus the name table.
///
/// Entries are inserted when a reactor is built or restarted and removed when it
/// terminates. Links store ids and resolve peers here.
#[derive(Default)]
pub(crate) struct Registry {
    entities: DashMap<ActorId, Arc<dyn Entity>>,
    names: DashMap<String, ActorId>,
}

impl Registry {
    pub(crate) fn insert(&self, entity: Arc<dyn Entity>) {
        self.entities.insert(entity.id(), entity);
    }

    pub(crate) fn remove(&self, id: ActorId) {
        if self.entities.remove(&id).is_some() {
            trace!(actor = %id, "deregistered");
        }
        self.names.retain(|_, named| *named != id);
    }

    pub(crate) fn get(&self, id: ActorId) -> Option<ActorRef> {
        self.entities
            .get(&id)
            .map(|entry| ActorRef::from_entity(Arc::clone(entry.value())))
    }

    pub(crate) fn len(&self) -> usize {
        self.entities.len()
    }

    pub(crate) fn register_name(&self, name: &str, id: ActorId) -> Option<ActorId> {
        self.names.insert(name.to_string(), id)
    }

    pub(crate) fn unregister_name(&self, name: &str) -> Option<ActorId> {
        self.names.remove(name).map(|(_, id)| id)
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<ActorId> {
        self.names.get(name).map(|entry| *entry.value())
    }
}
