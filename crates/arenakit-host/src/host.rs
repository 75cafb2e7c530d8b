use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use arenakit_types::{ArenaTypes, ExtensionId, TypeToken, VictoryTypes};
use tracing::{error, info, warn};

use crate::extension::{Extension, ExtensionContext};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("extension '{0}' is already loaded")]
    AlreadyLoaded(String),
    #[error("extension '{id}' panicked while loading: {message}")]
    Panicked { id: String, message: String },
}

/// Metadata kept for each loaded extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedExtension {
    pub id: ExtensionId,
    pub name: &'static str,
    pub description: &'static str,
}

/// Owns the type registries and the extensions that fill them
#[derive(Debug, Default)]
pub struct ArenaHost {
    arenas: ArenaTypes,
    victories: VictoryTypes,
    loaded: Vec<LoadedExtension>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl ArenaHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the extension's `on_load` against the registries
    ///
    /// A panic inside `on_load` is contained and reported, but types it
    /// registered before panicking stay registered.
    pub fn load_extension(&mut self, mut extension: Box<dyn Extension>) -> Result<(), ExtensionError> {
        let id = extension.id();
        if self.is_loaded(id) {
            warn!(target: "host", "Extension {} is already loaded; skipping", id);
            return Err(ExtensionError::AlreadyLoaded(id.to_string()));
        }

        let owner = ExtensionId::new(id);
        let mut ctx = ExtensionContext::new(owner.clone(), &mut self.arenas, &mut self.victories);
        if let Err(payload) =
            panic::catch_unwind(AssertUnwindSafe(|| extension.on_load(&mut ctx)))
        {
            let message = panic_message(payload.as_ref());
            error!(target: "host",
                "Extension {} ({}) panicked during load: {}",
                extension.name(),
                id,
                message
            );
            return Err(ExtensionError::Panicked {
                id: id.to_string(),
                message,
            });
        }

        info!(target: "host",
            "Loaded extension {} ({}): {} arena kinds, {} victory kinds",
            extension.name(),
            id,
            self.arenas.registry().list_owned_by(&owner).len(),
            self.victories.registry().list_owned_by(&owner).len()
        );
        self.loaded.push(LoadedExtension {
            id: owner,
            name: extension.name(),
            description: extension.description(),
        });
        Ok(())
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.loaded.iter().any(|ext| ext.id.as_str() == id)
    }

    pub fn loaded_extensions(&self) -> &[LoadedExtension] {
        &self.loaded
    }

    pub fn arenas(&self) -> &ArenaTypes {
        &self.arenas
    }

    pub fn arenas_mut(&mut self) -> &mut ArenaTypes {
        &mut self.arenas
    }

    pub fn victories(&self) -> &VictoryTypes {
        &self.victories
    }

    pub fn victories_mut(&mut self) -> &mut VictoryTypes {
        &mut self.victories
    }

    /// Every type an extension contributed, arenas first
    pub fn types_owned_by(&self, id: &str) -> Vec<TypeToken> {
        let owner = ExtensionId::new(id);
        let mut tokens = self.arenas.registry().list_owned_by(&owner);
        tokens.extend(self.victories.registry().list_owned_by(&owner));
        tokens
    }
}
