#![cfg(test)]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::{ComponentAdded, ComponentRef, RegistryBuilder, World};

#[derive(Debug, PartialEq)]
struct Position(i32);

#[derive(Debug, PartialEq)]
struct Health(u32);

#[derive(Debug, PartialEq)]
struct Velocity(i32);

#[derive(Debug, PartialEq)]
struct Mass(u32);

#[derive(Debug, PartialEq)]
struct Unregistered;

fn world() -> World {
    let mut builder = RegistryBuilder::new();
    builder.register::<Position>().unwrap();
    builder.register::<Health>().unwrap();
    builder.register::<Velocity>().unwrap();
    builder.register::<Mass>().unwrap();
    World::new(Rc::new(builder.build()))
}

fn matching<T: System>(world: &World, system: T) -> MatchingSystem<T> {
    MatchingSystem::new(world.registry(), world.channel(), system).unwrap()
}

#[derive(Default)]
struct Healing {
    updated: Vec<Entity>,
}

impl System for Healing {
    type Type = (Health, Position);

    fn update(&mut self, entity: &EntityHandle, (health, _): Refs<Self>) {
        health.borrow_mut().0 += 1;
        self.updated.push(entity.id());
    }
}

#[derive(Default)]
struct Physics {
    started: usize,
    fixed: usize,
}

impl System for Physics {
    type Type = (Position, Velocity, Mass, Health);

    fn start(&mut self, _entity: &EntityHandle, _components: Refs<Self>) {
        self.started += 1;
    }

    fn fixed_update(&mut self, _entity: &EntityHandle, components: Refs<Self>) {
        let (position, velocity, _, _) = components;
        position.borrow_mut().0 += velocity.borrow().0;
        self.fixed += 1;
    }
}

struct Counter;

impl System for Counter {
    type Type = (Health,);
}

#[test]
fn test_unregistered_signature() {
    struct Broken;

    impl System for Broken {
        type Type = (Position, Unregistered);
    }

    let world = world();
    let result = MatchingSystem::new(world.registry(), world.channel(), Broken);
    assert!(matches!(
        result.err(),
        Some(EcsError::UnregisteredComponent { .. })
    ));
    assert_eq!(world.channel().total_listener_count(), 0);
}

#[test]
fn test_required_mask() {
    let world = world();
    let system = matching(&world, Physics::default());
    assert_eq!(
        system.required_mask().ones().collect::<Vec<_>>(),
        [Registry::MANAGED_INDEX, 1, 2, 3, 4]
    );
}

fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut result = Vec::new();
    for (i, &first) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            result.push(tail);
        }
    }
    result
}

fn toggle(world: &mut World, entity: &EntityHandle, component: usize, attach: bool) {
    match (component, attach) {
        (0, true) => {
            world.insert(entity, Position(0)).unwrap();
        }
        (1, true) => {
            world.insert(entity, Velocity(0)).unwrap();
        }
        (2, true) => {
            world.insert(entity, Mass(0)).unwrap();
        }
        (3, true) => {
            world.insert(entity, Health(0)).unwrap();
        }
        (0, false) => {
            world.remove::<Position>(entity).unwrap();
        }
        (1, false) => {
            world.remove::<Velocity>(entity).unwrap();
        }
        (2, false) => {
            world.remove::<Mass>(entity).unwrap();
        }
        (3, false) => {
            world.remove::<Health>(entity).unwrap();
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_all_orderings() {
    let orders = permutations(&[0, 1, 2, 3]);
    assert_eq!(orders.len(), 24);

    for insert_order in &orders {
        for remove_order in &orders {
            let mut world = world();
            let system = matching(&world, Physics::default());
            let entity = world.spawn();

            for (step, &component) in insert_order.iter().enumerate() {
                toggle(&mut world, &entity, component, true);
                assert_eq!(system.contains(entity.id()), step == 3);
                assert!(system.verify(world.entities()).is_ok());
            }
            for &component in remove_order {
                toggle(&mut world, &entity, component, false);
                assert!(!system.contains(entity.id()));
                assert!(system.verify(world.entities()).is_ok());
            }
            assert!(system.is_empty());
        }
    }
}

#[test]
fn test_scenario() {
    let mut world = world();
    let system = matching(&world, Healing::default());

    let entity = world.spawn();
    let position = world.insert(&entity, Position(0)).unwrap();
    assert!(!system.contains(entity.id()));

    let health = world.insert(&entity, Health(10)).unwrap();
    let bundle = system.bundle(entity.id()).unwrap();
    let (bundle_health, bundle_position) = bundle.components();
    assert!(bundle_health.ptr_eq(&health));
    assert!(bundle_position.ptr_eq(&position));
    assert_eq!(bundle.entity(), &entity);

    world.remove::<Position>(&entity).unwrap();
    assert!(!system.contains(entity.id()));

    let new_position = world.insert(&entity, Position(5)).unwrap();
    let bundle = system.bundle(entity.id()).unwrap();
    let (bundle_health, bundle_position) = bundle.components();
    assert!(bundle_health.ptr_eq(&health));
    assert!(bundle_position.ptr_eq(&new_position));
    assert!(!bundle_position.ptr_eq(&position));
    assert_eq!(system.len(), 1);
}

#[test]
fn test_partial_add_creates_no_bundle() {
    let mut world = world();
    let system = matching(&world, Physics::default());

    let entity = world.spawn();
    world.insert(&entity, Position(0)).unwrap();
    world.insert(&entity, Velocity(1)).unwrap();
    world.insert(&entity, Health(1)).unwrap();
    assert!(system.is_empty());

    world.insert(&entity, Mass(3)).unwrap();
    assert_eq!(system.len(), 1);
    let bundle = system.bundle(entity.id()).unwrap();
    let (_, _, mass, _) = bundle.components();
    assert_eq!(*mass.borrow(), Mass(3));
}

#[test]
fn test_any_loss_removes_bundle() {
    let mut world = world();
    let system = matching(&world, Physics::default());

    let entity = world.spawn();
    world.insert(&entity, Position(0)).unwrap();
    world.insert(&entity, Velocity(1)).unwrap();
    world.insert(&entity, Mass(2)).unwrap();
    world.insert(&entity, Health(3)).unwrap();
    assert!(system.contains(entity.id()));

    world.remove::<Velocity>(&entity).unwrap();
    assert!(system.bundle(entity.id()).is_none());
    assert!(system.is_empty());
    assert!(entity.has::<Position>() && entity.has::<Mass>() && entity.has::<Health>());
}

#[test]
fn test_unrelated_component_keeps_bundle() {
    let mut world = world();
    let system = matching(&world, Counter);

    let entity = world.spawn();
    let health = world.insert(&entity, Health(3)).unwrap();
    world.insert(&entity, Position(0)).unwrap();
    world.remove::<Position>(&entity).unwrap();

    let bundle = system.bundle(entity.id()).unwrap();
    assert!(bundle.components().0.ptr_eq(&health));
}

#[test]
fn test_despawn_removes_from_every_system() {
    let mut world = world();
    let healing = matching(&world, Healing::default());
    let counter = matching(&world, Counter);
    let physics = matching(&world, Physics::default());

    let entity = world.spawn();
    world.insert(&entity, Position(0)).unwrap();
    world.insert(&entity, Velocity(0)).unwrap();
    world.insert(&entity, Mass(0)).unwrap();
    world.insert(&entity, Health(0)).unwrap();
    assert_eq!((healing.len(), counter.len(), physics.len()), (1, 1, 1));

    world.despawn(&entity).unwrap();
    assert_eq!((healing.len(), counter.len(), physics.len()), (0, 0, 0));
}

#[test]
fn test_seeding_is_idempotent() {
    let mut world = world();
    let entities: Vec<_> = (0..10)
        .map(|index| {
            let entity = world.spawn();
            world.insert(&entity, Health(index)).unwrap();
            if index % 2 == 0 {
                world.insert(&entity, Position(index as i32)).unwrap();
            }
            entity
        })
        .collect();

    let system = matching(&world, Healing::default());
    assert!(system.is_empty());

    system.create_bundles(&entities);
    let mut first: Vec<_> = system.bundles().entities().collect();
    system.create_bundles(world.entities());
    let mut second: Vec<_> = system.bundles().entities().collect();
    first.sort();
    second.sort();

    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
    assert!(system.verify(world.entities()).is_ok());
}

#[test]
fn test_single_entity_scan() {
    let mut world = world();
    let entity = world.spawn();
    world.insert(&entity, Health(1)).unwrap();

    let system = matching(&world, Healing::default());
    assert!(!system.create_bundle(&entity));
    world.insert(&entity, Position(1)).unwrap();
    assert!(system.remove_bundle(entity.id()));
    assert!(!system.remove_bundle(entity.id()));
    assert!(system.create_bundle(&entity));
    assert!(system.contains(entity.id()));
}

#[test]
fn test_redelivered_event_rebuilds_bundle() {
    let mut world = world();
    let system = matching(&world, Counter);

    let entity = world.spawn();
    let health = world.insert(&entity, Health(1)).unwrap();
    world.channel().publish(&ComponentAdded {
        entity: entity.clone(),
        component: health.clone(),
    });

    assert_eq!(system.len(), 1);
    let bundle = system.bundle(entity.id()).unwrap();
    assert!(bundle.components().0.ptr_eq(&health));
}

#[test]
fn test_added_event_without_component_is_ignored() {
    let world = world();
    let system = matching(&world, Counter);

    // Mask is not updated by publishing the event directly.
    let mut other = self::world();
    let entity = other.spawn();
    world.channel().publish(&ComponentAdded {
        entity,
        component: ComponentRef::new(Health(1)),
    });
    assert!(system.is_empty());
}

#[test]
fn test_spawn_without_components() {
    let mut world = world();
    let system = matching(&world, Counter);

    let entity = world.spawn();
    assert!(!system.contains(entity.id()));
    world.insert(&entity, Health(0)).unwrap();
    assert!(system.contains(entity.id()));
}

#[test]
fn test_hooks() {
    let mut world = world();
    let mut system = matching(&world, Physics::default());

    for velocity in 1..=3 {
        let entity = world.spawn();
        world.insert(&entity, Position(0)).unwrap();
        world.insert(&entity, Velocity(velocity)).unwrap();
        world.insert(&entity, Mass(1)).unwrap();
        world.insert(&entity, Health(1)).unwrap();
    }

    system.start();
    system.fixed_update();
    system.fixed_update();
    system.update();
    assert_eq!(system.system().started, 3);
    assert_eq!(system.system().fixed, 6);

    let mut positions: Vec<_> = system
        .bundles()
        .iter()
        .map(|bundle| bundle.components().0.borrow().0)
        .collect();
    positions.sort_unstable();
    assert_eq!(positions, [2, 4, 6]);
}

#[test]
fn test_disabled_system_skips_hooks() {
    let mut world = world();
    let mut system = matching(&world, Healing::default());

    let entity = world.spawn();
    world.insert(&entity, Position(0)).unwrap();
    let health = world.insert(&entity, Health(0)).unwrap();

    system.set_enabled(false);
    system.update();
    assert_eq!(*health.borrow(), Health(0));

    world.remove::<Position>(&entity).unwrap();
    assert!(system.is_empty());

    system.set_enabled(true);
    world.insert(&entity, Position(0)).unwrap();
    system.update();
    assert_eq!(*health.borrow(), Health(1));
    assert_eq!(system.system().updated, [entity.id()]);
}

struct Reaper {
    world: Rc<RefCell<World>>,
    visited: Vec<Entity>,
}

impl System for Reaper {
    type Type = (Health,);

    fn update(&mut self, entity: &EntityHandle, _components: Refs<Self>) {
        self.visited.push(entity.id());
        let others: Vec<_> = self
            .world
            .borrow()
            .entities()
            .filter(|other| *other != entity)
            .cloned()
            .collect();
        let mut world = self.world.borrow_mut();
        for other in others {
            world.despawn(&other).unwrap();
        }
    }
}

#[test]
fn test_hook_destroying_other_entities() {
    let world = Rc::new(RefCell::new(world()));
    let mut system = {
        let world_ref = world.borrow();
        let reaper = Reaper {
            world: Rc::clone(&world),
            visited: Vec::new(),
        };
        matching(&world_ref, reaper)
    };
    for _ in 0..5 {
        let mut world = world.borrow_mut();
        let entity = world.spawn();
        world.insert(&entity, Health(1)).unwrap();
    }
    assert_eq!(system.len(), 5);

    system.update();
    assert_eq!(system.system().visited.len(), 1);
    assert_eq!(system.len(), 1);
    assert_eq!(world.borrow().len(), 1);
    assert!(system.verify(world.borrow().entities()).is_ok());
}

struct Suicide {
    world: Rc<RefCell<World>>,
    visited: usize,
}

impl System for Suicide {
    type Type = (Health,);

    fn update(&mut self, entity: &EntityHandle, (health,): (ComponentRef<Health>,)) {
        self.visited += 1;
        if health.borrow().0 == 0 {
            self.world.borrow_mut().despawn(entity).unwrap();
        }
    }
}

#[test]
fn test_hook_destroying_own_entity() {
    let world = Rc::new(RefCell::new(world()));
    let suicide = Suicide {
        world: Rc::clone(&world),
        visited: 0,
    };
    let mut system = matching(&world.borrow(), suicide);
    for health in 0..4 {
        let mut world = world.borrow_mut();
        let entity = world.spawn();
        world.insert(&entity, Health(health % 2)).unwrap();
    }

    system.update();
    assert_eq!(system.system().visited, 4);
    assert_eq!(system.len(), 2);

    system.update();
    assert_eq!(system.system().visited, 6);
}

#[test]
fn test_verify_detects_mismatch() {
    let mut world = world();
    let system = matching(&world, Counter);

    let entity = world.spawn();
    world.insert(&entity, Health(0)).unwrap();
    assert!(system.verify(world.entities()).is_ok());

    system.remove_bundle(entity.id());
    assert_eq!(
        system.verify(world.entities()),
        Err(EcsError::CacheMismatch {
            system: system.name().to_string(),
            missing: 1,
            stale: 0,
        })
    );

    system.create_bundle(&entity);
    assert_eq!(
        system.verify(std::iter::empty()),
        Err(EcsError::CacheMismatch {
            system: system.name().to_string(),
            missing: 0,
            stale: 1,
        })
    );
}

#[test]
fn test_drop_unsubscribes() {
    let mut world = world();
    let system = matching(&world, Physics::default());
    // Entity created and destroyed, plus attached and detached for each of 4 types.
    assert_eq!(world.channel().total_listener_count(), 10);

    drop(system);
    assert_eq!(world.channel().total_listener_count(), 0);

    let entity = world.spawn();
    world.insert(&entity, Health(0)).unwrap();
    world.despawn(&entity).unwrap();
}

#[test]
fn test_any_system() {
    let mut world = world();
    let entity = world.spawn();
    world.insert(&entity, Health(0)).unwrap();
    world.insert(&entity, Position(0)).unwrap();

    let mut systems: Vec<Box<dyn AnySystem>> = vec![
        Box::new(matching(&world, Counter)),
        Box::new(matching(&world, Healing::default())),
    ];
    let entities = world.snapshot();
    for system in &mut systems {
        assert!(system.is_empty());
        system.create_bundles(&entities);
        assert_eq!(system.len(), 1);
        system.update();
        assert!(system.verify(&entities).is_ok());
    }
    assert!(systems[1].name().ends_with("Healing"));
    assert_eq!(*entity.component::<Health>().unwrap().borrow(), Health(1));
}
