//! Reconciling nested child payloads with a user's loaded collection.

use tracing::warn;

use super::{EntityMapper, MappingError};
use crate::domain::{CollectionStrategy, Entity, EntityId, OwnedByUser, User};

/// Apply `payload` to the user's collection of `M::Entity` per `strategy`.
///
/// Returns the ids of existing children that were patched, so callers can
/// stamp their audit block. Children created here have no id yet.
pub(crate) fn apply_children<M>(
    mapper: &M,
    user: &mut User,
    payload: Option<&[M::Dto]>,
    strategy: CollectionStrategy,
) -> Result<Vec<EntityId>, MappingError>
where
    M: EntityMapper,
    M::Entity: OwnedByUser,
{
    let Some(items) = payload else {
        return Ok(Vec::new());
    };
    let mut patched = Vec::new();
    match strategy {
        CollectionStrategy::Ignore => {}
        CollectionStrategy::Replace => {
            M::Entity::detach_all(user)?;
            for item in items {
                mapper.to_entity(item)?.attach_to(user)?;
            }
        }
        CollectionStrategy::Merge => {
            for item in items {
                let Some(id) = mapper.dto_id(item) else {
                    mapper.to_entity(item)?.attach_to(user)?;
                    continue;
                };
                let siblings = M::Entity::siblings_mut(user)?;
                match siblings.iter_mut().find(|child| child.id() == Some(id)) {
                    Some(child) => {
                        mapper.partial_update(item, child);
                        patched.push(id);
                    }
                    None => warn!(
                        collection = M::Entity::COLLECTION,
                        %id,
                        "nested child does not belong to this user; skipped"
                    ),
                }
            }
        }
    }
    Ok(patched)
}
