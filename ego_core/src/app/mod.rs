//! Utilities for application initialization and its frame loop.

use std::ops::ControlFlow;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ego_ecs::{AnySystem, MatchingSystem, Registry, System, World};

use crate::{
    config::Config,
    error::{AppCreationError, AppError, Result},
};


/// Type which represents duration between two frames.
pub type DeltaTime = Duration;

/// General event of the application frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Called once, after systems were started.
    Created,

    /// Called after systems were updated for the frame.
    Update(DeltaTime),

    /// Called once, when frame loop is about to exit.
    Destroyed,
}

/// General context of the host loop: the world and all its systems.
///
/// Can be created using [`init`] function.
///
pub struct Application {
    config: Config,
    world: World,
    systems: Vec<Box<dyn AnySystem>>,
    accumulator: DeltaTime,
    started: bool,
    frames: u64,
}

impl Application {
    /// Creates new application with an empty world.
    pub(crate) fn new(config: Config, registry: Rc<Registry>) -> Self {
        log::info!(
            "application `{}` v{} created with {} component type(s)",
            config.name(),
            config.version(),
            registry.count(),
        );
        Self {
            config,
            world: World::new(registry),
            systems: Vec::new(),
            accumulator: DeltaTime::ZERO,
            started: false,
            frames: 0,
        }
    }

    /// Configuration of this application.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// World of this application.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// World of this application.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Count of frames executed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Adds system and creates bundles for all existing entities.
    ///
    /// Systems are updated in order of addition.
    ///
    /// # Errors
    ///
    /// An error is returned if any type of the system signature was not registered.
    ///
    pub fn add_system<T>(&mut self, system: T) -> Result<()>
    where
        T: System,
    {
        let system = MatchingSystem::new(self.world.registry(), self.world.channel(), system)?;
        system.create_bundles(self.world.entities());
        log::info!(
            "system `{}` added with {} bundle(s)",
            system.name(),
            system.len(),
        );
        self.systems.push(Box::new(system));
        Ok(())
    }

    /// Returns iterator over all systems.
    pub fn systems(&self) -> impl Iterator<Item = &(dyn AnySystem + 'static)> {
        self.systems.iter().map(|system| system.as_ref())
    }

    /// Retrieves system by its name.
    pub fn system_mut(&mut self, name: &str) -> Option<&mut (dyn AnySystem + 'static)> {
        self.systems
            .iter_mut()
            .find(|system| system.name() == name)
            .map(|system| system.as_mut())
    }

    /// Executes one frame of the application.
    ///
    /// Systems are started before the first frame.
    /// Then fixed update is executed once per each elapsed fixed time step,
    /// followed by one update of every system.
    ///
    /// # Errors
    ///
    /// An error is returned if validation is enabled
    /// and bundles of some system are out of sync with the world.
    ///
    pub fn frame(&mut self, delta_time: DeltaTime) -> Result<()> {
        if !self.started {
            self.started = true;
            self.systems.iter_mut().for_each(|system| system.start());
        }

        let fixed_timestep = self.config.fixed_timestep();
        if !fixed_timestep.is_zero() {
            self.accumulator += delta_time;
            let mut steps = 0;
            while self.accumulator >= fixed_timestep {
                if steps == self.config.max_fixed_steps() {
                    log::warn!(
                        "frame {} is too long: {:?} of fixed updates dropped",
                        self.frames,
                        self.accumulator,
                    );
                    self.accumulator = DeltaTime::ZERO;
                    break;
                }
                self.accumulator -= fixed_timestep;
                self.systems
                    .iter_mut()
                    .for_each(|system| system.fixed_update());
                steps += 1;
            }
        }
        self.systems.iter_mut().for_each(|system| system.update());
        self.frames += 1;

        if self.config.enable_validation() {
            self.validate()?;
        }
        Ok(())
    }

    /// Compares bundles of every system with the full scan of the world.
    ///
    /// # Errors
    ///
    /// An error is returned if bundles of some system are out of sync with the world.
    ///
    pub fn validate(&self) -> Result<()> {
        let entities = self.world.snapshot();
        let errors: Vec<_> = self
            .systems
            .iter()
            .filter_map(|system| system.verify(&entities).err())
            .collect();
        for error in &errors {
            log::error!("validation error: {}", error);
        }
        let failed = errors.len();
        match errors.into_iter().next() {
            Some(first) => Err(AppError::Validation { failed, first }),
            None => Ok(()),
        }
    }

    /// Starts the frame loop which measures real time between frames.
    ///
    /// Loop is executed until callback returns [`ControlFlow::Break`]
    /// or an error occurs.
    ///
    pub fn run(
        &mut self,
        mut callback: impl FnMut(&mut World, Event) -> ControlFlow<()>,
    ) -> Result<()> {
        let mut result = Ok(());
        let mut last_frame = Instant::now();
        let mut flow = ControlFlow::Continue(());
        while flow.is_continue() {
            let now = Instant::now();
            let delta_time = now.duration_since(last_frame);
            last_frame = now;

            let first = !self.started;
            if let Err(error) = self.frame(delta_time) {
                log::error!("frame error: {}", error);
                result = Err(error);
                break;
            }
            if first {
                flow = callback(&mut self.world, Event::Created);
                if flow.is_break() {
                    break;
                }
            }
            flow = callback(&mut self.world, Event::Update(delta_time));
        }
        let _ = callback(&mut self.world, Event::Destroyed);
        log::info!("closing this application after {} frame(s)", self.frames);
        result
    }
}

/// Creates a unique [`Application`] instance.
/// If application instance was created earlier, function call will return an error.
///
/// # Errors
///
/// An error is returned if application instance have already been initialized.
///
pub fn init(
    config: Config,
    registry: Rc<Registry>,
) -> std::result::Result<Application, AppCreationError> {
    static FLAG: AtomicBool = AtomicBool::new(false);

    if FLAG.swap(true, Ordering::SeqCst) {
        return Err(AppCreationError::Initialized);
    }
    Ok(Application::new(config, registry))
}
