//! Demo host for incremental entity matching of simple ECS

use std::error::Error;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use log::LevelFilter;
use semver::Version;

use ego_core::{app::Event, config::Config};
use ego_ecs::{EntityHandle, Refs, RegistryBuilder, System, World};

mod logger;

const APP_NAME: &str = env!("CARGO_CRATE_NAME", "library must be compiled by Cargo");
const APP_VERSION_STR: &str = env!("CARGO_PKG_VERSION", "library must be compiled by Cargo");

const FRAME_TIME: Duration = Duration::from_millis(16);
const FRAME_COUNT: u64 = 60;
const DISARM_FRAME: u64 = 30;

#[derive(Debug)]
struct Transform {
    x: f32,
    y: f32,
}

#[derive(Debug)]
struct Velocity {
    x: f32,
    y: f32,
}

#[derive(Debug)]
struct Health(i32);

#[derive(Debug)]
struct Armor(i32);

#[derive(Debug)]
struct Weapon {
    damage: i32,
    range: f32,
}

/// Pulls every moving entity down.
struct Gravity {
    acceleration: f32,
}

impl System for Gravity {
    type Type = (Velocity,);

    fn name(&self) -> &str {
        "gravity"
    }

    fn fixed_update(&mut self, _entity: &EntityHandle, (velocity,): Refs<Self>) {
        velocity.borrow_mut().y -= self.acceleration;
    }
}

/// Moves, wounds and reports every armed entity.
struct Combat;

impl System for Combat {
    type Type = (Transform, Health, Armor, Weapon);

    fn name(&self) -> &str {
        "combat"
    }

    fn start(&mut self, entity: &EntityHandle, (transform, health, ..): Refs<Self>) {
        log::info!(
            "{:?} enters combat at {:?} with {:?}",
            entity.id(),
            transform.borrow(),
            health.borrow(),
        );
    }

    fn fixed_update(
        &mut self,
        entity: &EntityHandle,
        (transform, health, armor, weapon): Refs<Self>,
    ) {
        let weapon = weapon.borrow();
        if transform.borrow().x.abs() > weapon.range {
            return;
        }
        let damage = (weapon.damage - armor.borrow().0).max(0);
        health.borrow_mut().0 -= damage;
        log::trace!("{:?} takes {} damage", entity.id(), damage);
        if let Some(velocity) = entity.component::<Velocity>() {
            let velocity = velocity.borrow();
            let mut transform = transform.borrow_mut();
            transform.x += velocity.x;
            transform.y += velocity.y;
        }
    }
}

type BoxedError = Box<dyn Error + Send + Sync>;

fn spawn_fighter(world: &mut World, x: f32, armor: i32) -> Result<EntityHandle, BoxedError> {
    let entity = world.spawn();
    world.insert(&entity, Transform { x, y: 0.0 })?;
    world.insert(&entity, Velocity { x: -x / 10.0, y: 0.0 })?;
    world.insert(&entity, Health(100))?;
    world.insert(&entity, Armor(armor))?;
    world.insert(
        &entity,
        Weapon {
            damage: 5,
            range: 50.0,
        },
    )?;
    Ok(entity)
}

/// Entry point of `ego-rs` demo
fn main() -> Result<(), BoxedError> {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _handle = logger::init(level)?;
    log::info!("logger initialized successfully");

    let version: Version = APP_VERSION_STR.parse()?;
    let enable_validation = cfg!(debug_assertions);
    let config = Config::new(APP_NAME.to_string(), version, enable_validation);

    let registry = RegistryBuilder::new()
        .with::<Transform>()?
        .with::<Velocity>()?
        .with::<Health>()?
        .with::<Armor>()?
        .with::<Weapon>()?
        .build();
    let mut application = ego_core::init(config, Rc::new(registry))?;

    let world = application.world_mut();
    let veteran = spawn_fighter(world, 20.0, 2)?;
    spawn_fighter(world, -40.0, 0)?;
    spawn_fighter(world, 80.0, 4)?;
    let rock = world.spawn();
    world.insert(&rock, Transform { x: 0.0, y: 0.0 })?;

    application.add_system(Gravity { acceleration: 0.1 })?;
    application.add_system(Combat)?;

    let mut frames = 0;
    application.run(|world, event| match event {
        Event::Created => {
            log::debug!("created with {} entities", world.len());
            ControlFlow::Continue(())
        }
        Event::Update(_) => {
            frames += 1;
            if frames == DISARM_FRAME {
                match world.remove::<Armor>(&veteran) {
                    Ok(armor) => log::info!("{:?} lost {:?}", veteran.id(), armor),
                    Err(error) => {
                        log::error!("cannot remove armor: {}", error);
                        return ControlFlow::Break(());
                    }
                }
            }
            thread::sleep(FRAME_TIME);
            if frames < FRAME_COUNT {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        }
        Event::Destroyed => {
            log::debug!("destroyed");
            ControlFlow::Break(())
        }
    })?;

    for system in application.systems() {
        log::info!("system `{}` ends with {} bundle(s)", system.name(), system.len());
    }
    if let Some(health) = veteran.component::<Health>() {
        log::info!("{:?} ends with {:?}", veteran.id(), health.borrow());
    }
    Ok(())
}
