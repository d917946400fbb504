//! Named test-data generators with correlation-keyed memoization
//!
//! A registry maps names to generator functions. Repeated calls that
//! share a correlation id return the first generated value, which keeps
//! non-deterministic data (names, ids) stable within one test scenario.
//! Known generators live in a static table assembled by
//! [`builtin_generators`] and are imported explicitly at construction;
//! there is no load-time global mutation.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::{Value, json};

/// Generator function: positional JSON arguments in, JSON value out.
pub type GeneratorFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("generator \"{0}\" already registered")]
    DuplicateName(String),
    #[error("no generator registered under \"{0}\"")]
    UnknownGenerator(String),
}

/// Per-instance generator collection and memoization cache.
pub struct GeneratorRegistry {
    generators: HashMap<String, GeneratorFn>,
    // Composite key: a name containing the separator character cannot
    // collide with another (name, correlation id) pair
    cache: HashMap<(String, String), Value>,
}

impl GeneratorRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generators: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// Registry pre-populated with the [`builtin_generators`] table.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, generator) in builtin_generators() {
            // The builtin table carries no duplicates
            let _ = registry.add(name, generator, false);
        }
        registry
    }

    /// Register a generator under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] when the name is taken
    /// and `override_existing` is false.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        generator: GeneratorFn,
        override_existing: bool,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if !override_existing && self.generators.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.generators.insert(name, generator);
        Ok(())
    }

    /// Register a batch of `(name, generator)` pairs.
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate name.
    pub fn add_all<I>(&mut self, generators: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = (String, GeneratorFn)>,
    {
        for (name, generator) in generators {
            self.add(name, generator, false)?;
        }
        Ok(())
    }

    /// Unregister a generator. Unknown names are a deliberate no-op:
    /// returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.generators.remove(name).is_some()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Generate a value by generator name.
    ///
    /// With a correlation id, the first generated value is cached under
    /// `(name, correlation_id)` and returned for every later call on
    /// this instance; without one, every call computes fresh.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownGenerator`] for unknown names.
    pub fn generate(
        &mut self,
        name: &str,
        args: &[Value],
        correlation_id: Option<&str>,
    ) -> Result<Value, RegistryError> {
        let generator = self
            .generators
            .get(name)
            .ok_or_else(|| RegistryError::UnknownGenerator(name.to_string()))?
            .clone();

        if let Some(id) = correlation_id {
            let key = (name.to_string(), id.to_string());
            if let Some(cached) = self.cache.get(&key) {
                return Ok(cached.clone());
            }
            let value = generator(args);
            self.cache.insert(key, value.clone());
            return Ok(value);
        }

        Ok(generator(args))
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.generators.keys())
            .field("cached", &self.cache.len())
            .finish()
    }
}

const MALE_NAMES: &[&str] = &[
    "James", "John", "Alex", "Keanu", "Michel", "Aaron", "Richard", "Ricardo",
];
const FEMALE_NAMES: &[&str] = &[
    "Karen", "Kate", "Maria", "Marry", "Lucia", "Tiffany", "Aki", "Noelle",
];
const LAST_NAMES: &[&str] = &[
    "Harris", "Robinson", "Walker", "Reaves", "Smith", "Levi", "Yamamoto", "Brodski",
    "Danielopoulos", "McNuggets", "Lopez", "Hernandez",
];

/// Static table of the known generators, injected into a registry via
/// [`GeneratorRegistry::with_builtins`].
///
/// `FirstName` accepts an optional gender argument: no argument or
/// `"male"` draws from the male table, any other value from the female
/// table.
#[must_use]
pub fn builtin_generators() -> Vec<(&'static str, GeneratorFn)> {
    vec![
        (
            "FirstName",
            Arc::new(|args: &[Value]| {
                let table = match args.first().and_then(Value::as_str) {
                    Some(gender) if gender.trim().eq_ignore_ascii_case("male") => MALE_NAMES,
                    Some(_) => FEMALE_NAMES,
                    None => MALE_NAMES,
                };
                pick(table)
            }) as GeneratorFn,
        ),
        (
            "LastName",
            Arc::new(|_: &[Value]| pick(LAST_NAMES)) as GeneratorFn,
        ),
    ]
}

fn pick(table: &[&str]) -> Value {
    let mut rng = SmallRng::from_entropy();
    match table.choose(&mut rng) {
        Some(name) => json!(name),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn constant(value: Value) -> GeneratorFn {
        Arc::new(move |_: &[Value]| value.clone())
    }

    fn counter() -> GeneratorFn {
        let next = AtomicU64::new(0);
        Arc::new(move |_: &[Value]| json!(next.fetch_add(1, Ordering::SeqCst)))
    }

    #[test]
    fn add_and_generate() {
        let mut registry = GeneratorRegistry::new();
        registry.add("Answer", constant(json!(42)), false).unwrap();
        assert_eq!(registry.generate("Answer", &[], None).unwrap(), json!(42));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = GeneratorRegistry::new();
        registry.add("G", constant(json!(1)), false).unwrap();

        let err = registry.add("G", constant(json!(2)), false).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("G".to_string()));
    }

    #[test]
    fn override_replaces_generator() {
        let mut registry = GeneratorRegistry::new();
        registry.add("G", constant(json!(1)), false).unwrap();
        registry.add("G", constant(json!(2)), true).unwrap();
        assert_eq!(registry.generate("G", &[], None).unwrap(), json!(2));
    }

    #[test]
    fn remove_is_tolerant_of_unknown_names() {
        let mut registry = GeneratorRegistry::new();
        registry.add("G", constant(json!(1)), false).unwrap();

        assert!(registry.remove("G"));
        assert!(!registry.remove("G"));
        assert!(!registry.contains("G"));
    }

    #[test]
    fn unknown_generator_fails() {
        let mut registry = GeneratorRegistry::new();
        let err = registry.generate("Nope", &[], None).unwrap_err();
        assert_eq!(err, RegistryError::UnknownGenerator("Nope".to_string()));
    }

    #[test]
    fn generator_receives_arguments() {
        let mut registry = GeneratorRegistry::new();
        registry
            .add(
                "Join",
                Arc::new(|args: &[Value]| {
                    let parts: Vec<&str> = args.iter().filter_map(Value::as_str).collect();
                    json!(parts.join("/"))
                }) as GeneratorFn,
                false,
            )
            .unwrap();

        let value = registry
            .generate("Join", &[json!("foo"), json!("bar")], None)
            .unwrap();
        assert_eq!(value, json!("foo/bar"));
    }

    #[test]
    fn correlation_id_memoizes_per_instance() {
        let mut registry = GeneratorRegistry::new();
        registry.add("Seq", counter(), false).unwrap();

        let first = registry.generate("Seq", &[], Some("scenario-1")).unwrap();
        let again = registry.generate("Seq", &[], Some("scenario-1")).unwrap();
        assert_eq!(first, again, "same correlation id returns cached value");

        let other = registry.generate("Seq", &[], Some("scenario-2")).unwrap();
        assert_ne!(first, other, "different correlation ids are independent");
    }

    #[test]
    fn no_correlation_id_always_computes_fresh() {
        let mut registry = GeneratorRegistry::new();
        registry.add("Seq", counter(), false).unwrap();

        let a = registry.generate("Seq", &[], None).unwrap();
        let b = registry.generate("Seq", &[], None).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn composite_cache_key_does_not_collide() {
        let mut registry = GeneratorRegistry::new();
        registry.add("a", constant(json!("first")), false).unwrap();
        registry
            .add("a.b", constant(json!("second")), false)
            .unwrap();

        // Under naive string concatenation both would key as "a.b.c",
        // and the second call would hit the first call's cache entry
        assert_eq!(
            registry.generate("a", &[], Some("b.c")).unwrap(),
            json!("first")
        );
        assert_eq!(
            registry.generate("a.b", &[], Some("c")).unwrap(),
            json!("second")
        );
        assert_eq!(
            registry.generate("a", &[], Some("b.c")).unwrap(),
            json!("first"),
            "repeated call must still see its own cached value"
        );
    }

    #[test]
    fn builtins_are_imported_on_request() {
        let mut registry = GeneratorRegistry::with_builtins();
        assert!(registry.contains("FirstName"));
        assert!(registry.contains("LastName"));

        let name = registry.generate("FirstName", &[], None).unwrap();
        assert!(MALE_NAMES.contains(&name.as_str().unwrap()));

        let name = registry
            .generate("FirstName", &[json!("female")], None)
            .unwrap();
        assert!(FEMALE_NAMES.contains(&name.as_str().unwrap()));
    }

    #[test]
    fn first_name_defaults_to_female_for_unrecognized_gender() {
        let mut registry = GeneratorRegistry::with_builtins();

        let name = registry
            .generate("FirstName", &[json!("nonbinary")], None)
            .unwrap();
        assert!(FEMALE_NAMES.contains(&name.as_str().unwrap()));

        let name = registry
            .generate("FirstName", &[json!("MALE")], None)
            .unwrap();
        assert!(MALE_NAMES.contains(&name.as_str().unwrap()));
    }

    #[test]
    fn empty_registry_has_no_builtins() {
        let registry = GeneratorRegistry::new();
        assert!(!registry.contains("FirstName"));
    }
}
