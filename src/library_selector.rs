//! Library selector: picks a content library and builds its form

use crate::config::EditorConfig;
use crate::form::Form;
use anyhow::{Context, Result};
use semform_core::{FormOptions, Registry};
use semform_types::Field;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Value of the "nothing selected" option
pub const NO_LIBRARY: &str = "-";

/// A content library as listed by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub name: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub title: String,
    #[serde(default)]
    pub restricted: bool,
    #[serde(default)]
    pub is_old: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutorial_url: Option<String>,
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.name, self.major_version, self.minor_version)
    }
}

/// One entry of the selector
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
    pub tutorial_url: Option<String>,
}

/// Source of library semantics
pub trait SemanticsLoader {
    /// Semantics of `library` ("name major.minor"), `None` if it has none
    fn load(&mut self, library: &str) -> Result<Option<Vec<Field>>>;
}

/// Loader over semantics held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSemanticsLoader {
    semantics: HashMap<String, Vec<Field>>,
}

impl StaticSemanticsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, library: &str, fields: Vec<Field>) -> Self {
        self.insert(library, fields);
        self
    }

    pub fn insert(&mut self, library: &str, fields: Vec<Field>) {
        self.semantics.insert(library.to_string(), fields);
    }
}

impl SemanticsLoader for StaticSemanticsLoader {
    fn load(&mut self, library: &str) -> Result<Option<Vec<Field>>> {
        Ok(self.semantics.get(library).cloned())
    }
}

/// What the selector currently shows
#[derive(Debug)]
pub enum SelectorState {
    /// No library chosen
    Empty,
    /// The chosen library has no semantics
    NoSemantics(String),
    Loaded(Form),
}

/// Asked before switching away from a chosen library, with the current and
/// the requested library. Returning false keeps the current one.
pub type ConfirmCallback = Rc<RefCell<Option<Box<dyn Fn(Option<&str>, &str) -> bool>>>>;

pub struct LibrarySelector {
    libraries: Vec<Library>,
    default_library: Option<String>,
    default_parameterized: Option<String>,
    default_params: Value,
    current: Option<String>,
    first_choice: bool,
    state: SelectorState,
    loader: Box<dyn SemanticsLoader>,
    registry: Registry,
    options: FormOptions,
    strict_params: bool,
    confirm: ConfirmCallback,
}

impl LibrarySelector {
    /// Create a selector. `default_params` is the JSON of existing content;
    /// anything but a JSON object is replaced by `{}`.
    pub fn new(
        libraries: Vec<Library>,
        default_library: Option<&str>,
        default_params: &str,
        loader: Box<dyn SemanticsLoader>,
    ) -> Self {
        let default_params = match serde_json::from_str::<Value>(default_params) {
            Ok(value) if value.is_object() => value,
            Ok(_) => {
                log::warn!("Default params are not an object, starting from scratch");
                json!({})
            }
            Err(e) => {
                log::warn!("Default params are broken ({}), starting from scratch", e);
                json!({})
            }
        };

        Self {
            libraries,
            default_library: default_library.map(str::to_string),
            default_parameterized: default_library
                .map(|lib| lib.replacen('.', "-", 1).to_lowercase()),
            default_params,
            current: default_library.map(str::to_string),
            first_choice: true,
            state: SelectorState::Empty,
            loader,
            registry: semform_core::global_registry(),
            options: FormOptions::default(),
            strict_params: false,
            confirm: Rc::new(RefCell::new(None)),
        }
    }

    /// Create a selector offering the libraries of `config`, building forms
    /// with its options and params strictness
    pub fn from_config(
        config: &EditorConfig,
        default_library: Option<&str>,
        default_params: &str,
        loader: Box<dyn SemanticsLoader>,
    ) -> Self {
        Self::new(config.libraries.clone(), default_library, default_params, loader)
            .with_options(config.form_options())
            .strict_params(config.strict_params)
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    /// Refuse to hand out params of an invalid form
    pub fn strict_params(mut self, strict: bool) -> Self {
        self.strict_params = strict;
        self
    }

    pub fn on_confirm(&self, callback: impl Fn(Option<&str>, &str) -> bool + 'static) {
        *self.confirm.borrow_mut() = Some(Box::new(callback));
    }

    pub fn default_params(&self) -> &Value {
        &self.default_params
    }

    /// Selectable libraries. Restricted and outdated ones are left out, except
    /// the library of the content being edited.
    pub fn options(&self) -> Vec<LibraryOption> {
        let mut options = vec![LibraryOption {
            value: NO_LIBRARY.to_string(),
            label: NO_LIBRARY.to_string(),
            selected: false,
            tutorial_url: None,
        }];

        for library in &self.libraries {
            let value = library.to_string();
            let is_default = self.default_library.as_deref() == Some(value.as_str());
            if !is_default && (library.restricted || library.is_old) {
                continue;
            }
            let label = if library.is_old {
                format!("{} (deprecated)", library.title)
            } else {
                library.title.clone()
            };
            options.push(LibraryOption {
                selected: self.current.as_deref() == Some(value.as_str()),
                value,
                label,
                tutorial_url: library.tutorial_url.clone(),
            });
        }
        options
    }

    /// Switch to `library`. Returns `Ok(false)` if the switch was not
    /// confirmed.
    pub fn select(&mut self, library: &str) -> Result<bool> {
        if !self.first_choice {
            let confirmed = match self.confirm.borrow().as_ref() {
                Some(confirm) => confirm(self.current.as_deref(), library),
                None => true,
            };
            if !confirmed {
                log::info!("Keeping {:?}, change to {} not confirmed", self.current, library);
                return Ok(false);
            }
        }

        self.load_semantics(library)?;
        self.current = Some(library.to_string());
        if library != NO_LIBRARY {
            self.first_choice = false;
        }
        Ok(true)
    }

    fn is_default(&self, library: &str) -> bool {
        self.default_library.as_deref() == Some(library)
            || self.default_parameterized.as_deref() == Some(library)
    }

    fn load_semantics(&mut self, library: &str) -> Result<()> {
        if let SelectorState::Loaded(form) = &mut self.state {
            form.remove();
        }
        self.state = SelectorState::Empty;
        if library == NO_LIBRARY {
            return Ok(());
        }

        log::info!("Loading semantics for {}", library);
        let semantics = self
            .loader
            .load(library)
            .with_context(|| format!("Failed to load semantics for {}", library))?;
        let Some(semantics) = semantics else {
            log::warn!("{} has no semantics", library);
            self.state = SelectorState::NoSemantics(library.to_string());
            return Ok(());
        };

        let params = if self.is_default(library) {
            self.default_params.clone()
        } else {
            json!({})
        };
        let form = Form::with_registry(semantics, params, self.registry.clone(), self.options.clone())
            .with_context(|| format!("Failed to build form for {}", library))?;
        self.state = SelectorState::Loaded(form);
        Ok(())
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    pub fn form(&self) -> Option<&Form> {
        match &self.state {
            SelectorState::Loaded(form) => Some(form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut Form> {
        match &mut self.state {
            SelectorState::Loaded(form) => Some(form),
            _ => None,
        }
    }

    /// Validate the form and return its params. With strict params an
    /// invalid form yields nothing.
    pub fn params(&mut self) -> Option<Value> {
        let strict = self.strict_params;
        let form = self.form_mut()?;
        if !form.validate() {
            log::warn!("Form has {} errors", form.errors().len());
            if strict {
                return None;
            }
        }
        Some(form.params().clone())
    }
}
