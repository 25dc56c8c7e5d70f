//! Service registry: named, interchangeable implementations of disciplines.
//!
//! A *service* is a modeling responsibility (`propulsion.engine`); each
//! registered *implementation* (`rubber_engine`, `fixed_sfc`) provides a
//! factory building a [`Discipline`] from options.
//!
//! The registry is an explicit object. A process-wide instance pre-wired with
//! the built-in plugin is available through [`global_registry`] for
//! convenience; [`reset_global_registry`] restores it for test isolation.
//!
//! Plugins are discovered lazily, on the first query, through an injectable
//! [`PluginProvider`]. A plugin that fails to register, or an implementation
//! whose factory fails (or panics) when probed with default options, is
//! recorded as unavailable and discovery continues with the rest.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::builtin::BuiltinProvider;
use crate::error::{ComponentResult, RegistryError, RegistryResult};
use crate::traits::{Discipline, ServiceImpl};

/// Options passed to a factory: free-form JSON values keyed by name.
pub type ServiceOptions = BTreeMap<String, serde_json::Value>;

/// Factory building a discipline from resolved options.
pub type DisciplineFactory =
    Arc<dyn Fn(&ServiceOptions) -> ComponentResult<Arc<dyn Discipline>> + Send + Sync>;

/// What to do when `(service, implementation)` is already registered with a
/// different factory or properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterMode {
    #[default]
    Strict,
    Overwrite,
}

/// One accepted option of an implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub name: String,
    pub default: serde_json::Value,
    pub description: Option<String>,
}

/// Metadata attached to an implementation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceProperties {
    pub domain: Option<String>,
    pub description: Option<String>,
    /// Picked by `resolve` when no implementation id is given.
    pub default: bool,
    /// Accepted options; any other key is rejected at resolution.
    pub options: Vec<OptionSpec>,
    pub tags: BTreeMap<String, String>,
}

impl ServiceProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn default_impl(mut self) -> Self {
        self.default = true;
        self
    }

    pub fn option(
        mut self,
        name: impl Into<String>,
        default: impl Into<serde_json::Value>,
        description: impl Into<String>,
    ) -> Self {
        self.options.push(OptionSpec {
            name: name.into(),
            default: default.into(),
            description: Some(description.into()),
        });
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Options with every schema default filled in.
    pub fn default_options(&self) -> ServiceOptions {
        self.options
            .iter()
            .map(|o| (o.name.clone(), o.default.clone()))
            .collect()
    }

    fn unknown_keys(&self, options: &ServiceOptions) -> Vec<String> {
        options
            .keys()
            .filter(|k| !self.options.iter().any(|o| &o.name == *k))
            .cloned()
            .collect()
    }
}

/// Property filter for [`ServiceRegistry::find_implementations`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceFilter {
    pub domain: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl ServiceFilter {
    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..Self::default()
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn matches(&self, props: &ServiceProperties) -> bool {
        if let Some(domain) = &self.domain
            && props.domain.as_ref() != Some(domain)
        {
            return false;
        }
        self.tags.iter().all(|(k, v)| props.tags.get(k) == Some(v))
    }
}

#[derive(Clone)]
pub struct ServiceDescriptor {
    pub service_id: String,
    pub implementation_id: String,
    pub properties: ServiceProperties,
    factory: DisciplineFactory,
    type_id: Option<TypeId>,
    unavailable: Option<String>,
}

impl ServiceDescriptor {
    pub fn is_available(&self) -> bool {
        self.unavailable.is_none()
    }

    fn same_factory(&self, other: &ServiceDescriptor) -> bool {
        match (self.type_id, other.type_id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => Arc::ptr_eq(&self.factory, &other.factory),
            _ => false,
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service_id", &self.service_id)
            .field("implementation_id", &self.implementation_id)
            .field("properties", &self.properties)
            .field("unavailable", &self.unavailable)
            .finish_non_exhaustive()
    }
}

/// A plugin or implementation that discovery had to skip.
#[derive(Debug, Clone, PartialEq)]
pub struct Unavailable {
    pub plugin: String,
    pub service_id: Option<String>,
    pub implementation_id: Option<String>,
    pub reason: String,
}

/// A bundle of registrations.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;
    fn register(&self, registry: &mut ServiceRegistry) -> RegistryResult<()>;
}

/// Source of plugins, queried once per discovery.
pub trait PluginProvider: Send + Sync {
    fn plugins(&self) -> Vec<Box<dyn Plugin>>;
}

impl<F> PluginProvider for F
where
    F: Fn() -> Vec<Box<dyn Plugin>> + Send + Sync,
{
    fn plugins(&self) -> Vec<Box<dyn Plugin>> {
        self()
    }
}

/// Result of [`ServiceRegistry::resolve`].
#[derive(Clone)]
pub struct ResolvedService {
    pub service_id: String,
    pub implementation_id: String,
    pub options: ServiceOptions,
    pub discipline: Arc<dyn Discipline>,
}

impl fmt::Debug for ResolvedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedService")
            .field("service_id", &self.service_id)
            .field("implementation_id", &self.implementation_id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

pub struct ServiceRegistry {
    descriptors: Vec<ServiceDescriptor>,
    unavailable: Vec<Unavailable>,
    provider: Option<Box<dyn PluginProvider>>,
    loaded: bool,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("descriptors", &self.descriptors)
            .field("unavailable", &self.unavailable)
            .field("has_provider", &self.provider.is_some())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl ServiceRegistry {
    /// Empty registry without plugin discovery.
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            unavailable: Vec::new(),
            provider: None,
            loaded: false,
        }
    }

    /// Empty registry that discovers plugins from `provider` on first query.
    pub fn with_provider(provider: impl PluginProvider + 'static) -> Self {
        Self {
            provider: Some(Box::new(provider)),
            ..Self::new()
        }
    }

    /// Registry discovering the built-in reference disciplines.
    pub fn with_builtins() -> Self {
        Self::with_provider(BuiltinProvider)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Register a closure factory.
    ///
    /// Re-registering the same factory (same `Arc`) with equal properties is a
    /// no-op; anything else under an existing pair needs `RegisterMode::Overwrite`.
    pub fn register(
        &mut self,
        service_id: impl Into<String>,
        implementation_id: impl Into<String>,
        factory: DisciplineFactory,
        properties: ServiceProperties,
        mode: RegisterMode,
    ) -> RegistryResult<()> {
        self.insert(
            ServiceDescriptor {
                service_id: service_id.into(),
                implementation_id: implementation_id.into(),
                properties,
                factory,
                type_id: None,
                unavailable: None,
            },
            mode,
        )
    }

    /// Register a [`ServiceImpl`] type; the type is the factory identity.
    pub fn register_type<T: ServiceImpl>(&mut self, mode: RegisterMode) -> RegistryResult<()> {
        let factory: DisciplineFactory =
            Arc::new(|options: &ServiceOptions| -> ComponentResult<Arc<dyn Discipline>> {
                Ok(Arc::new(T::from_options(options)?))
            });
        self.insert(
            ServiceDescriptor {
                service_id: T::SERVICE_ID.to_string(),
                implementation_id: T::IMPLEMENTATION_ID.to_string(),
                properties: T::properties(),
                factory,
                type_id: Some(TypeId::of::<T>()),
                unavailable: None,
            },
            mode,
        )
    }

    fn position(&self, service_id: &str, implementation_id: &str) -> Option<usize> {
        self.descriptors
            .iter()
            .position(|d| d.service_id == service_id && d.implementation_id == implementation_id)
    }

    fn insert(&mut self, desc: ServiceDescriptor, mode: RegisterMode) -> RegistryResult<()> {
        let existing = self.position(&desc.service_id, &desc.implementation_id);

        if let Some(pos) = existing {
            let current = &self.descriptors[pos];
            if current.same_factory(&desc) && current.properties == desc.properties {
                return Ok(());
            }
            if mode == RegisterMode::Strict {
                return Err(RegistryError::DuplicateImplementation {
                    service: desc.service_id,
                    implementation: desc.implementation_id,
                });
            }
        }

        if desc.properties.default
            && let Some(other) = self.descriptors.iter().enumerate().find(|(i, d)| {
                Some(*i) != existing && d.service_id == desc.service_id && d.properties.default
            })
        {
            return Err(RegistryError::ConflictingDefault {
                service: desc.service_id,
                existing: other.1.implementation_id.clone(),
                new: desc.implementation_id,
            });
        }

        debug!(
            service = %desc.service_id,
            implementation = %desc.implementation_id,
            overwrite = existing.is_some(),
            "registered implementation"
        );
        match existing {
            Some(pos) => self.descriptors[pos] = desc,
            None => self.descriptors.push(desc),
        }
        Ok(())
    }

    /// Run plugin discovery once; later calls are no-ops until `reset()`.
    pub fn discover(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        let Some(provider) = self.provider.take() else {
            return;
        };

        let plugins = provider.plugins();
        for plugin in &plugins {
            self.load_plugin(plugin.as_ref());
        }
        self.provider = Some(provider);

        info!(
            plugins = plugins.len(),
            implementations = self.descriptors.len(),
            unavailable = self.unavailable.len(),
            "plugin discovery complete"
        );
    }

    fn load_plugin(&mut self, plugin: &dyn Plugin) {
        // Overwrites are undone too, not only appends.
        let snapshot = self.descriptors.clone();
        let before = snapshot.len();
        let outcome = catch_unwind(AssertUnwindSafe(|| plugin.register(self)));
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err.to_string()),
            Err(payload) => Some(panic_message(payload.as_ref())),
        };

        if let Some(reason) = failure {
            warn!(plugin = plugin.name(), %reason, "plugin failed to register");
            self.descriptors = snapshot;
            self.unavailable.push(Unavailable {
                plugin: plugin.name().to_string(),
                service_id: None,
                implementation_id: None,
                reason,
            });
            return;
        }

        for desc in &mut self.descriptors[before..] {
            let options = desc.properties.default_options();
            let factory = Arc::clone(&desc.factory);
            let probe = catch_unwind(AssertUnwindSafe(|| factory(&options)));
            let reason = match probe {
                Ok(Ok(_)) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };
            warn!(
                plugin = plugin.name(),
                service = %desc.service_id,
                implementation = %desc.implementation_id,
                %reason,
                "implementation unavailable"
            );
            desc.unavailable = Some(reason.clone());
            self.unavailable.push(Unavailable {
                plugin: plugin.name().to_string(),
                service_id: Some(desc.service_id.clone()),
                implementation_id: Some(desc.implementation_id.clone()),
                reason,
            });
        }
    }

    /// Known service ids, in first registration order.
    pub fn services(&mut self) -> Vec<String> {
        self.discover();
        let mut seen: Vec<String> = Vec::new();
        for desc in &self.descriptors {
            if !seen.contains(&desc.service_id) {
                seen.push(desc.service_id.clone());
            }
        }
        seen
    }

    /// Available implementation ids of a service, in registration order.
    pub fn get_implementations<'a>(
        &'a mut self,
        service_id: &'a str,
    ) -> impl Iterator<Item = &'a str> {
        self.discover();
        self.descriptors
            .iter()
            .filter(move |d| d.service_id == service_id && d.is_available())
            .map(|d| d.implementation_id.as_str())
    }

    /// Available implementations of a service whose properties match `filter`.
    pub fn find_implementations(
        &mut self,
        service_id: &str,
        filter: &ServiceFilter,
    ) -> Vec<String> {
        self.discover();
        self.descriptors
            .iter()
            .filter(|d| d.service_id == service_id && d.is_available())
            .filter(|d| filter.matches(&d.properties))
            .map(|d| d.implementation_id.clone())
            .collect()
    }

    pub fn descriptor(
        &mut self,
        service_id: &str,
        implementation_id: &str,
    ) -> Option<&ServiceDescriptor> {
        self.discover();
        self.position(service_id, implementation_id)
            .map(|pos| &self.descriptors[pos])
    }

    /// Every descriptor, including unavailable ones.
    pub fn descriptors(&mut self) -> &[ServiceDescriptor] {
        self.discover();
        &self.descriptors
    }

    /// Plugins and implementations skipped during discovery.
    pub fn unavailable(&mut self) -> &[Unavailable] {
        self.discover();
        &self.unavailable
    }

    /// Build a discipline for `service_id`.
    ///
    /// Without an implementation id the sole available implementation, or
    /// the one marked default, is picked; otherwise the request is ambiguous.
    pub fn resolve(
        &mut self,
        service_id: &str,
        implementation_id: Option<&str>,
        options: Option<&ServiceOptions>,
    ) -> RegistryResult<ResolvedService> {
        self.discover();

        let candidates: Vec<&ServiceDescriptor> = self
            .descriptors
            .iter()
            .filter(|d| d.service_id == service_id)
            .collect();
        if candidates.is_empty() {
            return Err(RegistryError::UnknownService {
                service: service_id.to_string(),
            });
        }

        let desc = match implementation_id {
            Some(id) => candidates
                .iter()
                .find(|d| d.implementation_id == id)
                .copied()
                .ok_or_else(|| RegistryError::UnknownImplementation {
                    service: service_id.to_string(),
                    implementation: id.to_string(),
                    known: candidates
                        .iter()
                        .map(|d| d.implementation_id.clone())
                        .collect(),
                })?,
            None => pick_default(service_id, &candidates)?,
        };

        if let Some(reason) = &desc.unavailable {
            return Err(RegistryError::ImplementationUnavailable {
                service: desc.service_id.clone(),
                implementation: desc.implementation_id.clone(),
                reason: reason.clone(),
            });
        }

        let mut resolved = desc.properties.default_options();
        if let Some(given) = options {
            let unknown = desc.properties.unknown_keys(given);
            if !unknown.is_empty() {
                return Err(RegistryError::InvalidOptions {
                    service: desc.service_id.clone(),
                    implementation: desc.implementation_id.clone(),
                    keys: unknown,
                });
            }
            resolved.extend(given.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let discipline = (desc.factory)(&resolved).map_err(|source| RegistryError::Factory {
            service: desc.service_id.clone(),
            implementation: desc.implementation_id.clone(),
            source,
        })?;

        debug!(
            service = %desc.service_id,
            implementation = %desc.implementation_id,
            "resolved service"
        );
        Ok(ResolvedService {
            service_id: desc.service_id.clone(),
            implementation_id: desc.implementation_id.clone(),
            options: resolved,
            discipline,
        })
    }

    /// Forget every registration and the discovery state.
    ///
    /// The plugin provider is kept, so the next query discovers again.
    pub fn reset(&mut self) {
        self.descriptors.clear();
        self.unavailable.clear();
        self.loaded = false;
    }
}

fn pick_default<'a>(
    service_id: &str,
    candidates: &[&'a ServiceDescriptor],
) -> RegistryResult<&'a ServiceDescriptor> {
    let available: Vec<&ServiceDescriptor> = candidates
        .iter()
        .copied()
        .filter(|d| d.is_available())
        .collect();

    if let Some(marked) = available.iter().find(|d| d.properties.default) {
        return Ok(*marked);
    }
    match available.as_slice() {
        [only] => Ok(*only),
        // Every implementation is unavailable: report the first one's reason.
        [] => Ok(candidates[0]),
        _ => Err(RegistryError::AmbiguousService {
            service: service_id.to_string(),
            candidates: available
                .iter()
                .map(|d| d.implementation_id.clone())
                .collect(),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

static GLOBAL: OnceLock<RwLock<ServiceRegistry>> = OnceLock::new();

/// Process-wide registry, discovering the built-in plugin on first use.
pub fn global_registry() -> &'static RwLock<ServiceRegistry> {
    GLOBAL.get_or_init(|| RwLock::new(ServiceRegistry::with_builtins()))
}

/// Write access to the global registry (a poisoned lock is recovered).
pub fn global_registry_mut() -> RwLockWriteGuard<'static, ServiceRegistry> {
    global_registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Read access to the global registry.
pub fn global_registry_ref() -> RwLockReadGuard<'static, ServiceRegistry> {
    global_registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Clear the global registry; built-ins are rediscovered on next use.
pub fn reset_global_registry() {
    global_registry_mut().reset();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentError;
    use crate::io::{Inputs, Outputs};
    use ac_graph::VariableSpec;
    use serde_json::json;

    struct Constant(f64);

    impl Discipline for Constant {
        fn declare(&self) -> Vec<VariableSpec> {
            vec![VariableSpec::output("c")]
        }

        fn compute(&self, _inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()> {
            outputs.set("c", self.0)
        }
    }

    fn constant_factory(value: f64) -> DisciplineFactory {
        Arc::new(move |_options: &ServiceOptions| -> ComponentResult<Arc<dyn Discipline>> {
            let d: Arc<dyn Discipline> = Arc::new(Constant(value));
            Ok(d)
        })
    }

    #[test]
    fn strict_duplicate_with_other_factory_fails() {
        let mut reg = ServiceRegistry::new();
        reg.register(
            "a",
            "one",
            constant_factory(1.0),
            ServiceProperties::new(),
            RegisterMode::Strict,
        )
        .unwrap();
        let err = reg
            .register(
                "a",
                "one",
                constant_factory(2.0),
                ServiceProperties::new(),
                RegisterMode::Strict,
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateImplementation { .. }));
    }

    #[test]
    fn identical_registration_is_noop() {
        let mut reg = ServiceRegistry::new();
        let factory = constant_factory(1.0);
        for _ in 0..2 {
            reg.register(
                "a",
                "one",
                Arc::clone(&factory),
                ServiceProperties::new(),
                RegisterMode::Strict,
            )
            .unwrap();
        }
        assert_eq!(reg.get_implementations("a").count(), 1);
    }

    #[test]
    fn overwrite_replaces_factory() {
        let mut reg = ServiceRegistry::new();
        reg.register(
            "a",
            "one",
            constant_factory(1.0),
            ServiceProperties::new(),
            RegisterMode::Strict,
        )
        .unwrap();
        reg.register(
            "a",
            "one",
            constant_factory(2.0),
            ServiceProperties::new(),
            RegisterMode::Overwrite,
        )
        .unwrap();
        let resolved = reg.resolve("a", None, None).unwrap();
        let mut out = Outputs::new();
        out.declare("c", ac_core::Value::unset());
        resolved.discipline.compute(&Inputs::new(), &mut out).unwrap();
        assert_eq!(out.scalar("c"), Some(2.0));
    }

    #[test]
    fn second_default_conflicts() {
        let mut reg = ServiceRegistry::new();
        let props = ServiceProperties::new().default_impl();
        reg.register("a", "one", constant_factory(1.0), props.clone(), RegisterMode::Strict)
            .unwrap();
        let err = reg
            .register("a", "two", constant_factory(2.0), props, RegisterMode::Strict)
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::ConflictingDefault {
                service: "a".into(),
                existing: "one".into(),
                new: "two".into(),
            }
        );
    }

    #[test]
    fn resolve_picks_marked_default() {
        let mut reg = ServiceRegistry::new();
        reg.register(
            "a",
            "one",
            constant_factory(1.0),
            ServiceProperties::new(),
            RegisterMode::Strict,
        )
        .unwrap();
        reg.register(
            "a",
            "two",
            constant_factory(2.0),
            ServiceProperties::new().default_impl(),
            RegisterMode::Strict,
        )
        .unwrap();
        assert_eq!(reg.resolve("a", None, None).unwrap().implementation_id, "two");
    }

    #[test]
    fn resolve_errors() {
        let mut reg = ServiceRegistry::new();
        reg.register(
            "a",
            "one",
            constant_factory(1.0),
            ServiceProperties::new().option("gain", 1.0, "gain"),
            RegisterMode::Strict,
        )
        .unwrap();
        reg.register(
            "b",
            "broken",
            Arc::new(|_: &ServiceOptions| -> ComponentResult<Arc<dyn Discipline>> {
                Err(ComponentError::InvalidArg { what: "always fails" })
            }),
            ServiceProperties::new(),
            RegisterMode::Strict,
        )
        .unwrap();

        assert!(matches!(
            reg.resolve("zzz", None, None),
            Err(RegistryError::UnknownService { .. })
        ));
        assert!(matches!(
            reg.resolve("a", Some("nope"), None),
            Err(RegistryError::UnknownImplementation { .. })
        ));

        let mut bad = ServiceOptions::new();
        bad.insert("gian".into(), json!(2.0));
        match reg.resolve("a", None, Some(&bad)) {
            Err(RegistryError::InvalidOptions { keys, .. }) => assert_eq!(keys, ["gian"]),
            other => panic!("unexpected: {other:?}"),
        }

        let mut good = ServiceOptions::new();
        good.insert("gain".into(), json!(2.0));
        let resolved = reg.resolve("a", None, Some(&good)).unwrap();
        assert_eq!(resolved.options["gain"], json!(2.0));

        assert!(matches!(
            reg.resolve("b", None, None),
            Err(RegistryError::Factory { .. })
        ));
    }

    #[test]
    fn filter_by_properties() {
        let mut reg = ServiceRegistry::new();
        reg.register(
            "a",
            "one",
            constant_factory(1.0),
            ServiceProperties::new().domain("aero").tag("fidelity", "low"),
            RegisterMode::Strict,
        )
        .unwrap();
        reg.register(
            "a",
            "two",
            constant_factory(2.0),
            ServiceProperties::new().domain("aero").tag("fidelity", "high"),
            RegisterMode::Strict,
        )
        .unwrap();
        let filter = ServiceFilter::domain("aero").tag("fidelity", "high");
        let high = reg.find_implementations("a", &filter);
        assert_eq!(high, ["two"]);
        assert!(reg
            .find_implementations("a", &ServiceFilter::domain("weight"))
            .is_empty());
    }

    #[test]
    fn reset_forgets_everything() {
        let mut reg = ServiceRegistry::new();
        reg.register(
            "a",
            "one",
            constant_factory(1.0),
            ServiceProperties::new(),
            RegisterMode::Strict,
        )
        .unwrap();
        reg.reset();
        assert!(reg.services().is_empty());
    }
}
