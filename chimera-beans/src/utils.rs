//! Utility functions for the factory bean registry
//!
//! Naming helpers shared by registration and lookup, plus the tracker used to
//! detect re-entrant product creation.

/// Naming convention utilities for bean names
pub mod naming {
    use crate::constants::FACTORY_BEAN_PREFIX;

    /// Converts a PascalCase type name to camelCase for bean naming.
    ///
    /// `ConnectionPoolFactory` becomes `connectionPoolFactory`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chimera_beans::utils::naming::to_camel_case;
    ///
    /// assert_eq!(to_camel_case("ConnectionPoolFactory"), "connectionPoolFactory");
    /// assert_eq!(to_camel_case("A"), "a");
    /// assert_eq!(to_camel_case(""), "");
    /// ```
    pub fn to_camel_case(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = String::with_capacity(s.len());
                result.extend(first.to_lowercase());
                result.push_str(chars.as_str());
                result
            }
        }
    }

    /// Strips the module path from a `std::any::type_name` string.
    ///
    /// Generic arguments are kept as they are.
    ///
    /// ```
    /// use chimera_beans::utils::naming::short_type_name;
    ///
    /// assert_eq!(short_type_name("my_app::db::ConnectionPool"), "ConnectionPool");
    /// assert_eq!(short_type_name("alloc::vec::Vec<my_app::Job>"), "Vec<my_app::Job>");
    /// assert_eq!(short_type_name("u32"), "u32");
    /// ```
    pub fn short_type_name(type_name: &str) -> &str {
        let head_end = type_name.find('<').unwrap_or(type_name.len());
        match type_name[..head_end].rfind("::") {
            Some(pos) => &type_name[pos + 2..],
            None => type_name,
        }
    }

    /// Default bean name derived from a type: its short name in camelCase.
    pub fn default_bean_name<T: ?Sized>() -> String {
        to_camel_case(short_type_name(std::any::type_name::<T>()))
    }

    /// Whether the name asks for the factory itself rather than its product.
    pub fn is_factory_dereference(name: &str) -> bool {
        name.starts_with(FACTORY_BEAN_PREFIX)
    }

    /// Removes every leading factory dereference prefix.
    ///
    /// ```
    /// use chimera_beans::utils::naming::transformed_bean_name;
    ///
    /// assert_eq!(transformed_bean_name("&&pool"), "pool");
    /// assert_eq!(transformed_bean_name("pool"), "pool");
    /// ```
    pub fn transformed_bean_name(name: &str) -> &str {
        name.trim_start_matches(FACTORY_BEAN_PREFIX)
    }

    /// Name under which the factory itself can be looked up.
    pub fn factory_bean_name(name: &str) -> String {
        format!("{}{}", FACTORY_BEAN_PREFIX, transformed_bean_name(name))
    }
}

/// Dependency resolution utilities
pub mod dependency {
    use std::thread::{self, ThreadId};

    use parking_lot::Mutex;

    /// Tracks products currently being created to detect circular references.
    ///
    /// Marks are kept per thread: a product being created on another thread
    /// is not a cycle. Insertion order is kept so the creation chain can be
    /// reported.
    #[derive(Debug, Default)]
    pub struct CreationTracker {
        creating: Mutex<Vec<(ThreadId, String)>>,
    }

    impl CreationTracker {
        /// Creates a new empty creation tracker.
        pub fn new() -> Self {
            Self::default()
        }

        /// Checks if a product is currently being created on this thread.
        pub fn is_creating(&self, name: &str) -> bool {
            let current = thread::current().id();
            self.creating
                .lock()
                .iter()
                .any(|(id, n)| *id == current && n == name)
        }

        /// Marks a product as being created on this thread.
        ///
        /// Returns `false` if it was already being created (circular reference).
        pub fn start_creating(&self, name: &str) -> bool {
            let current = thread::current().id();
            let mut creating = self.creating.lock();
            if creating.iter().any(|(id, n)| *id == current && n == name) {
                return false;
            }
            creating.push((current, name.to_string()));
            true
        }

        /// Marks a product as finished being created on this thread.
        pub fn finish_creating(&self, name: &str) {
            let current = thread::current().id();
            self.creating
                .lock()
                .retain(|(id, n)| !(*id == current && n == name));
        }

        /// Gets this thread's creation chain, outermost first.
        pub fn current_creating(&self) -> Vec<String> {
            let current = thread::current().id();
            self.creating
                .lock()
                .iter()
                .filter(|(id, _)| *id == current)
                .map(|(_, n)| n.clone())
                .collect()
        }

        /// Number of products currently in creation, on all threads.
        pub fn len(&self) -> usize {
            self.creating.lock().len()
        }

        pub fn is_empty(&self) -> bool {
            self.creating.lock().is_empty()
        }
    }

    /// Clears the creation mark when dropped, whatever the outcome.
    pub struct CreationGuard<'a> {
        tracker: &'a CreationTracker,
        name: String,
    }

    impl<'a> CreationGuard<'a> {
        /// Returns `None` when the product is already being created.
        pub fn enter(tracker: &'a CreationTracker, name: &str) -> Option<Self> {
            if tracker.start_creating(name) {
                Some(Self {
                    tracker,
                    name: name.to_string(),
                })
            } else {
                None
            }
        }
    }

    impl Drop for CreationGuard<'_> {
        fn drop(&mut self) {
            self.tracker.finish_creating(&self.name);
        }
    }
}
