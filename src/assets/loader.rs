//! Background loading
//!
//! Each request runs on its own short-lived thread. A worker never touches
//! the scene; it hands its result to an [`AssetSink`] and exits.

use std::{
    path::PathBuf,
    sync::mpsc,
    thread::{self, JoinHandle},
};

use super::{obj, AssetEvent, TextureSlot};
use crate::{config::StageConfig, interaction::Character};

/// Where finished loads are delivered
pub trait AssetSink: Clone + Send + 'static {
    /// Returns `false` once the receiving side is gone
    fn deliver(&self, event: AssetEvent) -> bool;
}

impl AssetSink for mpsc::Sender<AssetEvent> {
    fn deliver(&self, event: AssetEvent) -> bool {
        self.send(event).is_ok()
    }
}

pub struct AssetLoader<S: AssetSink> {
    sink: S,
    workers: Vec<JoinHandle<()>>,
}

impl<S: AssetSink> AssetLoader<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            workers: Vec::new(),
        }
    }

    /// Requests both characters, the environment map and the floor texture
    pub fn load_stage(&mut self, config: &StageConfig) {
        for (character, placement) in [
            (Character::Sarah, &config.sarah),
            (Character::Spiderman, &config.spiderman),
        ] {
            self.load_model(
                character,
                config.asset_path(&placement.path),
                placement.node.clone(),
            );
        }
        self.load_texture(
            TextureSlot::Environment,
            config.asset_path(&config.environment_map),
        );
        self.load_texture(TextureSlot::Floor, config.asset_path(&config.floor_texture));
    }

    pub fn load_model(&mut self, character: Character, path: PathBuf, node: Option<String>) {
        let sink = self.sink.clone();
        self.spawn(format!("load {:?}", character), move || {
            let result = super::load_model(&path, node.as_deref());
            if let Err(e) = &result {
                log::error!("failed to load {:?} from {}: {}", character, path.display(), e);
            }
            let event = AssetEvent::Model {
                character,
                path,
                result,
            };
            if !sink.deliver(event) {
                log::debug!("{:?} loaded after shutdown", character);
            }
        });
    }

    pub fn load_texture(&mut self, slot: TextureSlot, path: PathBuf) {
        let sink = self.sink.clone();
        self.spawn(format!("load {:?}", slot), move || {
            let result = obj::decode_image(&path);
            match &result {
                Ok(image) => log::info!(
                    "decoded {} ({}x{})",
                    path.display(),
                    image.width(),
                    image.height()
                ),
                Err(e) => log::error!("failed to load {:?} texture {}: {}", slot, path.display(), e),
            }
            if !sink.deliver(AssetEvent::Texture { slot, path, result }) {
                log::debug!("{:?} texture loaded after shutdown", slot);
            }
        });
    }

    fn spawn(&mut self, name: String, work: impl FnOnce() + Send + 'static) {
        self.workers.retain(|worker| !worker.is_finished());
        match thread::Builder::new().name(name.clone()).spawn(work) {
            Ok(handle) => self.workers.push(handle),
            Err(e) => log::error!("could not start '{}': {}", name, e),
        }
    }

    /// Loads still running
    pub fn pending(&self) -> usize {
        self.workers.iter().filter(|w| !w.is_finished()).count()
    }

    /// Blocks until every worker has delivered
    pub fn wait(&mut self) {
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("asset worker panicked");
            }
        }
    }
}
