//! hecs-backed store of persistent objects, spawners and mobs.

use hecs::World;
use tracing::{debug, trace};
use voxterra_core::coords::{ChunkPos, WorldPos};
use voxterra_core::types::Facing;
use voxterra_voxel::EntityRecord;
use voxterra_world::{DimensionEvent, SpawnerRequest};

use crate::spawner::AreaSpawner;
use crate::{Anchor, Entity, Mob, PersistentObject, Transform};

/// Live entities of one dimension.
pub struct EntityWorld {
    world: World,
    seed: u64,
}

impl std::fmt::Debug for EntityWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityWorld")
            .field("entities", &self.world.len())
            .field("seed", &self.seed)
            .finish()
    }
}

impl EntityWorld {
    /// Create an empty store; `seed` drives spawner randomness.
    pub fn new(seed: u64) -> Self {
        Self {
            world: World::new(),
            seed,
        }
    }

    /// Instantiate a persistent object from its record.
    ///
    /// A record identical to an existing object returns that object.
    pub fn instantiate(&mut self, record: EntityRecord) -> Entity {
        if let Some(existing) = self.find_object(&record) {
            return existing;
        }
        trace!(id = %record.entity_id, pos = ?record.position, "instantiated object");
        let anchor = Anchor(record.position.chunk_pos());
        let transform = Transform::at_voxel(record.position, record.facing);
        self.world.spawn((PersistentObject { record }, transform, anchor))
    }

    fn find_object(&self, record: &EntityRecord) -> Option<Entity> {
        self.world
            .query::<&PersistentObject>()
            .iter()
            .find(|(_, obj)| obj.record == *record)
            .map(|(e, _)| e)
    }

    /// Start an area spawner. A spawner for the same structure anchor that is
    /// already running is returned instead.
    pub fn add_spawner(&mut self, request: SpawnerRequest) -> Entity {
        let existing = self
            .world
            .query::<&AreaSpawner>()
            .iter()
            .find(|(_, s)| s.anchor() == request.anchor && s.request().structure_id == request.structure_id)
            .map(|(e, _)| e);
        if let Some(e) = existing {
            return e;
        }
        debug!(structure = %request.structure_id, anchor = ?request.anchor, "spawner started");
        let anchor = Anchor(request.anchor.chunk_pos());
        let spawner = AreaSpawner::new(self.seed, request);
        self.world.spawn((spawner, anchor))
    }

    /// Run spawners for `dt` seconds. Returns how many mobs were spawned.
    pub fn update(&mut self, dt: f32) -> usize {
        let spawners: Vec<Entity> = self.world.query::<&AreaSpawner>().iter().map(|(e, _)| e).collect();
        let mut spawned = 0;
        for spawner_entity in spawners {
            let alive = self.alive_per_entry(spawner_entity);
            let mut new_mobs = Vec::new();
            if let Ok(mut spawner) = self.world.get::<&mut AreaSpawner>(spawner_entity) {
                let counts = spawner.advance(dt, &alive);
                for (i, count) in counts.into_iter().enumerate() {
                    let mob_id = spawner.request().mobs[i].mob_id.clone();
                    for _ in 0..count {
                        new_mobs.push((mob_id.clone(), spawner.sample_position()));
                    }
                }
            }
            let Ok(anchor) = self.world.get::<&Anchor>(spawner_entity).map(|a| *a) else {
                continue;
            };
            for (mob_id, pos) in new_mobs {
                trace!(mob = %mob_id, ?pos, "mob spawned");
                self.world.spawn((
                    Mob {
                        mob_id,
                        spawner: spawner_entity,
                    },
                    Transform::at_voxel(pos, Facing::North),
                    anchor,
                ));
                spawned += 1;
            }
        }
        spawned
    }

    fn alive_per_entry(&self, spawner: Entity) -> Vec<u32> {
        let Ok(s) = self.world.get::<&AreaSpawner>(spawner) else {
            return Vec::new();
        };
        let mut alive = vec![0u32; s.request().mobs.len()];
        for (_, mob) in self.world.query::<&Mob>().iter() {
            if mob.spawner != spawner {
                continue;
            }
            if let Some(i) = s.request().mobs.iter().position(|m| m.mob_id == mob.mob_id) {
                alive[i] += 1;
            }
        }
        alive
    }

    /// Remove the persistent object standing at `pos`.
    pub fn remove_at(&mut self, pos: WorldPos) -> Option<EntityRecord> {
        let entity = self
            .world
            .query::<&PersistentObject>()
            .iter()
            .find(|(_, obj)| obj.record.position == pos)
            .map(|(e, _)| e)?;
        let obj = self.world.remove_one::<PersistentObject>(entity).ok()?;
        let _ = self.world.despawn(entity);
        Some(obj.record)
    }

    /// Despawn everything anchored to `chunk`, including mobs of spawners
    /// anchored there. Returns how many entities were removed.
    pub fn despawn_chunk(&mut self, chunk: ChunkPos) -> usize {
        let mut doomed: Vec<Entity> = self
            .world
            .query::<&Anchor>()
            .iter()
            .filter(|(_, a)| a.0 == chunk)
            .map(|(e, _)| e)
            .collect();
        let spawners: Vec<Entity> = doomed
            .iter()
            .copied()
            .filter(|&e| self.world.get::<&AreaSpawner>(e).is_ok())
            .collect();
        if !spawners.is_empty() {
            let orphans: Vec<Entity> = self
                .world
                .query::<(&Mob, &Anchor)>()
                .iter()
                .filter(|(_, (m, a))| a.0 != chunk && spawners.contains(&m.spawner))
                .map(|(e, _)| e)
                .collect();
            doomed.extend(orphans);
        }
        let count = doomed.len();
        for entity in doomed {
            let _ = self.world.despawn(entity);
        }
        if count > 0 {
            trace!(?chunk, count, "despawned chunk entities");
        }
        count
    }

    /// Persistent object records anchored to `chunk`, sorted by position.
    pub fn records_in_chunk(&self, chunk: ChunkPos) -> Vec<EntityRecord> {
        let mut out: Vec<_> = self
            .world
            .query::<(&PersistentObject, &Anchor)>()
            .iter()
            .filter(|(_, (_, a))| a.0 == chunk)
            .map(|(_, (obj, _))| obj.record.clone())
            .collect();
        out.sort_unstable_by(|a, b| a.position.cmp(&b.position).then_with(|| a.entity_id.cmp(&b.entity_id)));
        out
    }

    /// React to one dimension event.
    pub fn handle_event(&mut self, event: DimensionEvent) {
        match event {
            DimensionEvent::EntitySpawned(record) => {
                self.instantiate(record);
            }
            DimensionEvent::ChunkEntitiesReset { chunk, records } => {
                let stale: Vec<Entity> = self
                    .world
                    .query::<(&PersistentObject, &Anchor)>()
                    .iter()
                    .filter(|(_, (_, a))| a.0 == chunk)
                    .map(|(e, _)| e)
                    .collect();
                for entity in stale {
                    let _ = self.world.despawn(entity);
                }
                for record in records {
                    self.instantiate(record);
                }
            }
            DimensionEvent::SpawnerPlaced(request) => {
                self.add_spawner(request);
            }
            DimensionEvent::ChunkUnloaded(chunk) => {
                self.despawn_chunk(chunk);
            }
        }
    }

    /// React to a batch of events in order.
    pub fn handle_events(&mut self, events: impl IntoIterator<Item = DimensionEvent>) {
        for event in events {
            self.handle_event(event);
        }
    }

    /// Drop every entity.
    pub fn clear(&mut self) {
        self.world.clear();
    }

    pub fn object_count(&self) -> usize {
        self.world.query::<&PersistentObject>().iter().count()
    }

    pub fn spawner_count(&self) -> usize {
        self.world.query::<&AreaSpawner>().iter().count()
    }

    pub fn mob_count(&self) -> usize {
        self.world.query::<&Mob>().iter().count()
    }

    /// World transform of a live entity.
    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }
}
