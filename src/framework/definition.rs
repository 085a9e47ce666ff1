//! Test-case definitions
//!
//! A [`TestDefinition`] is a named unit bundling an ordered list of test
//! methods, a factory producing a fresh instance, optional instance-level
//! hooks and optional class-level hooks. Method names are declared up front
//! and resolved once at registration; nothing is discovered at run time.
//!
//! Definitions come from either the [`TestCase`] trait
//! (`TestDefinition::of::<MyTests>()`) or a [`DefinitionBuilder`] for ad-hoc
//! closures.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::failure::Check;
use crate::error::{DisttestError, Result};

/// Prefix every test method name must carry
pub const TEST_METHOD_PREFIX: &str = "test_";

type MethodFn<T> = Arc<dyn Fn(&mut T) -> Check + Send + Sync>;
type ClassHookFn = Arc<dyn Fn() -> Check + Send + Sync>;
type InstantiateFn = Arc<dyn Fn() -> Box<dyn Instance> + Send + Sync>;

/// Class-level hook capabilities a definition declares
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassHooks {
    pub has_class_setup: bool,
    pub has_class_teardown: bool,
}

impl ClassHooks {
    pub const NONE: ClassHooks = ClassHooks {
        has_class_setup: false,
        has_class_teardown: false,
    };

    pub const BOTH: ClassHooks = ClassHooks {
        has_class_setup: true,
        has_class_teardown: true,
    };
}

/// A type whose instances carry test state and expose test methods.
///
/// Instances are built with `Default` once per execution context, right
/// before the methods run. Class-level hooks are only invoked when
/// [`TestCase::class_hooks`] declares them.
pub trait TestCase: Default + Send + 'static {
    /// Definition name used to qualify outcomes
    const NAME: &'static str;

    /// Test methods in execution order
    fn test_methods() -> Vec<(&'static str, fn(&mut Self) -> Check)>;

    fn class_hooks() -> ClassHooks {
        ClassHooks::NONE
    }

    fn setup_class() -> Check {
        Ok(())
    }

    fn teardown_class() -> Check {
        Ok(())
    }

    /// Runs before every test method
    fn setup(&mut self) -> Check {
        Ok(())
    }

    /// Runs after every test method, whatever its outcome
    fn teardown(&mut self) -> Check {
        Ok(())
    }
}

/// Type-erased test instance
pub(crate) trait Instance: Send {
    fn setup(&mut self) -> Check;
    fn invoke(&mut self, method: &str) -> Check;
    fn teardown(&mut self) -> Check;
}

struct Blueprint<T> {
    methods: Vec<(String, MethodFn<T>)>,
    setup: Option<MethodFn<T>>,
    teardown: Option<MethodFn<T>>,
}

struct Bound<T> {
    state: T,
    blueprint: Arc<Blueprint<T>>,
}

impl<T: Send + 'static> Instance for Bound<T> {
    fn setup(&mut self) -> Check {
        match &self.blueprint.setup {
            Some(hook) => hook(&mut self.state),
            None => Ok(()),
        }
    }

    fn invoke(&mut self, method: &str) -> Check {
        match self.blueprint.methods.iter().find(|(name, _)| name == method) {
            Some((_, f)) => f(&mut self.state),
            None => Err(super::Failure::unexpected(
                "MissingMethod",
                format!("no test method named '{method}'"),
            )),
        }
    }

    fn teardown(&mut self) -> Check {
        match &self.blueprint.teardown {
            Some(hook) => hook(&mut self.state),
            None => Ok(()),
        }
    }
}

/// Registered unit of test methods
#[derive(Clone)]
pub struct TestDefinition {
    name: String,
    method_names: Vec<String>,
    hooks: ClassHooks,
    class_setup: Option<ClassHookFn>,
    class_teardown: Option<ClassHookFn>,
    instantiate: InstantiateFn,
}

impl TestDefinition {
    /// Build a definition from a [`TestCase`] implementation
    pub fn of<T: TestCase>() -> Self {
        let mut builder = DefinitionBuilder::new(T::NAME, T::default)
            .setup(T::setup)
            .teardown(T::teardown);

        for (name, method) in T::test_methods() {
            builder = builder.method(name, method);
        }

        let hooks = T::class_hooks();
        if hooks.has_class_setup {
            builder = builder.class_setup(T::setup_class);
        }
        if hooks.has_class_teardown {
            builder = builder.class_teardown(T::teardown_class);
        }

        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared test methods, in execution order
    pub fn method_names(&self) -> &[String] {
        &self.method_names
    }

    pub fn method_count(&self) -> usize {
        self.method_names.len()
    }

    pub fn class_hooks(&self) -> ClassHooks {
        self.hooks
    }

    /// Outcome key for one of this definition's methods
    pub fn qualified_name(&self, method: &str) -> String {
        format!("{}.{}", self.name, method)
    }

    /// Check the definition against the test-case contract
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DisttestError::type_constraint(
                &self.name,
                "definition name must not be empty",
            ));
        }

        let mut seen = HashSet::new();
        for method in &self.method_names {
            if !method.starts_with(TEST_METHOD_PREFIX) || method.len() == TEST_METHOD_PREFIX.len()
            {
                return Err(DisttestError::type_constraint(
                    &self.name,
                    format!("method '{method}' does not follow the '{TEST_METHOD_PREFIX}<name>' convention"),
                ));
            }
            if !seen.insert(method.as_str()) {
                return Err(DisttestError::type_constraint(
                    &self.name,
                    format!("method '{method}' is declared more than once"),
                ));
            }
        }

        if self.hooks.has_class_setup != self.class_setup.is_some()
            || self.hooks.has_class_teardown != self.class_teardown.is_some()
        {
            return Err(DisttestError::type_constraint(
                &self.name,
                "declared class hooks do not match the provided hooks",
            ));
        }

        Ok(())
    }

    pub(crate) fn run_class_setup(&self) -> Check {
        match (&self.class_setup, self.hooks.has_class_setup) {
            (Some(hook), true) => hook(),
            _ => Ok(()),
        }
    }

    pub(crate) fn run_class_teardown(&self) -> Check {
        match (&self.class_teardown, self.hooks.has_class_teardown) {
            (Some(hook), true) => hook(),
            _ => Ok(()),
        }
    }

    pub(crate) fn instantiate(&self) -> Box<dyn Instance> {
        (self.instantiate)()
    }
}

impl fmt::Debug for TestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDefinition")
            .field("name", &self.name)
            .field("method_names", &self.method_names)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Builder for definitions backed by closures
pub struct DefinitionBuilder<T> {
    name: String,
    factory: Arc<dyn Fn() -> T + Send + Sync>,
    methods: Vec<(String, MethodFn<T>)>,
    setup: Option<MethodFn<T>>,
    teardown: Option<MethodFn<T>>,
    class_setup: Option<ClassHookFn>,
    class_teardown: Option<ClassHookFn>,
}

impl<T: Send + 'static> DefinitionBuilder<T> {
    pub fn new(name: impl Into<String>, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
            methods: Vec::new(),
            setup: None,
            teardown: None,
            class_setup: None,
            class_teardown: None,
        }
    }

    /// Append a test method; methods run in the order they are added
    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut T) -> Check + Send + Sync + 'static,
    ) -> Self {
        self.methods.push((name.into(), Arc::new(f)));
        self
    }

    pub fn setup(mut self, f: impl Fn(&mut T) -> Check + Send + Sync + 'static) -> Self {
        self.setup = Some(Arc::new(f));
        self
    }

    pub fn teardown(mut self, f: impl Fn(&mut T) -> Check + Send + Sync + 'static) -> Self {
        self.teardown = Some(Arc::new(f));
        self
    }

    pub fn class_setup(mut self, f: impl Fn() -> Check + Send + Sync + 'static) -> Self {
        self.class_setup = Some(Arc::new(f));
        self
    }

    pub fn class_teardown(mut self, f: impl Fn() -> Check + Send + Sync + 'static) -> Self {
        self.class_teardown = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> TestDefinition {
        let method_names = self.methods.iter().map(|(name, _)| name.clone()).collect();
        let hooks = ClassHooks {
            has_class_setup: self.class_setup.is_some(),
            has_class_teardown: self.class_teardown.is_some(),
        };

        let blueprint = Arc::new(Blueprint {
            methods: self.methods,
            setup: self.setup,
            teardown: self.teardown,
        });
        let factory = self.factory;
        let instantiate: InstantiateFn = Arc::new(move || {
            Box::new(Bound {
                state: factory(),
                blueprint: Arc::clone(&blueprint),
            }) as Box<dyn Instance>
        });

        TestDefinition {
            name: self.name,
            method_names,
            hooks,
            class_setup: self.class_setup,
            class_teardown: self.class_teardown,
            instantiate,
        }
    }
}

impl<T: Default + Send + 'static> DefinitionBuilder<T> {
    /// Builder whose instances come from `T::default()`
    pub fn with_default(name: impl Into<String>) -> Self {
        Self::new(name, T::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{assert_equal, Failure};

    #[derive(Default)]
    struct Counter {
        value: i32,
    }

    impl TestCase for Counter {
        const NAME: &'static str = "Counter";

        fn test_methods() -> Vec<(&'static str, fn(&mut Self) -> Check)> {
            vec![("test_starts_at_ten", Counter::starts_at_ten)]
        }

        fn class_hooks() -> ClassHooks {
            ClassHooks {
                has_class_setup: true,
                has_class_teardown: false,
            }
        }

        fn setup(&mut self) -> Check {
            self.value = 10;
            Ok(())
        }
    }

    impl Counter {
        fn starts_at_ten(&mut self) -> Check {
            assert_equal(self.value, 10)
        }
    }

    #[test]
    fn test_definition_from_trait() {
        let def = TestDefinition::of::<Counter>();
        assert_eq!(def.name(), "Counter");
        assert_eq!(def.method_names(), ["test_starts_at_ten"]);
        assert_eq!(
            def.class_hooks(),
            ClassHooks {
                has_class_setup: true,
                has_class_teardown: false
            }
        );
        assert!(def.validate().is_ok());

        let mut instance = def.instantiate();
        assert!(instance.setup().is_ok());
        assert!(instance.invoke("test_starts_at_ten").is_ok());
        assert!(instance.teardown().is_ok());
    }

    #[test]
    fn test_instances_are_fresh() {
        let def = DefinitionBuilder::<Counter>::with_default("Fresh")
            .method("test_bump", |c| {
                c.value += 1;
                assert_equal(c.value, 1)
            })
            .build();

        for _ in 0..2 {
            let mut instance = def.instantiate();
            assert!(instance.invoke("test_bump").is_ok());
        }
    }

    #[test]
    fn test_invoke_unknown_method() {
        let def = DefinitionBuilder::<Counter>::with_default("Empty").build();
        let err = def.instantiate().invoke("test_missing").unwrap_err();
        assert!(matches!(err, Failure::Unexpected { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let def = DefinitionBuilder::<Counter>::with_default("Bad")
            .method("check_value", |_| Ok(()))
            .build();
        assert!(matches!(
            def.validate(),
            Err(DisttestError::TypeConstraint { .. })
        ));

        let def = DefinitionBuilder::<Counter>::with_default("Dup")
            .method("test_a", |_| Ok(()))
            .method("test_a", |_| Ok(()))
            .build();
        assert!(def.validate().is_err());

        let def = DefinitionBuilder::<Counter>::with_default("  ").build();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_qualified_name() {
        let def = TestDefinition::of::<Counter>();
        assert_eq!(def.qualified_name("test_x"), "Counter.test_x");
    }
}
