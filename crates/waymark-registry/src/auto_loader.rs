//! Declaration scanning without per-member boilerplate.
//!
//! An [`AutoLoader`] is the explicit-registration replacement for reflective
//! field scanning: a module builds an ordered list of declarations at
//! startup, each carrying a member name, a loading priority, an optional
//! exclusion set, and one facet per extension point the value implements.
//! Nested auto-loaders compose into trees and are recursed with the same
//! filter and exclusion rules.
//!
//! Scanning is priority-deterministic: declarations are visited in
//! descending priority, ties keeping declaration order, even though bucket
//! iteration inside the registry carries no ordering guarantee of its own.

use std::any::{Any, TypeId};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use waymark_core::{DEFAULT_PRIORITY, ExtensionPoint, Loaded, LoaderId};

use crate::loader::Loader;

/// The facet map of one declaration: per extension point, the declared
/// value as an `Arc` of that point's object type.
type FacetMap = rustc_hash::FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>;

struct ScanNode {
    /// Member name, used in scan diagnostics.
    name: String,
    priority: i32,
    /// `None` - never skipped. `Some(empty)` - skipped for every point.
    /// `Some({..})` - skipped when scanning for a listed point.
    skipped: Option<FxHashSet<TypeId>>,
    payload: NodePayload,
}

enum NodePayload {
    Declaration(FacetMap),
    Loader(AutoLoader),
}

impl ScanNode {
    fn is_skipped_for(&self, point: TypeId) -> bool {
        match &self.skipped {
            None => false,
            Some(points) => points.is_empty() || points.contains(&point),
        }
    }
}

/// A declaring construct that registers all of its eligible members.
///
/// # Examples
///
/// ```ignore
/// let mut items = AutoLoader::new(LoaderId::new("mymod", "items")?);
/// items
///     .declare("gold_ring")
///     .priority(1)
///     .expose::<dyn CommonLoaded>(gold_ring);
/// items
///     .declare("debug_wand")
///     .skip_for::<dyn ServerLoaded>()
///     .expose::<dyn CommonLoaded>(Arc::clone(&wand))
///     .expose::<dyn ServerLoaded>(wand);
///
/// let mut root = AutoLoader::new(LoaderId::new("mymod", "root")?);
/// root.nest("items", items);
/// root.register(&mut loader);
/// ```
pub struct AutoLoader {
    id: LoaderId,
    nodes: Vec<ScanNode>,
}

impl AutoLoader {
    /// Creates an empty declaring construct owned by `id`.
    pub fn new(id: LoaderId) -> Self {
        Self {
            id,
            nodes: Vec::new(),
        }
    }

    /// Declares a member value; facets are attached through the returned
    /// builder.
    pub fn declare(&mut self, name: impl Into<String>) -> DeclarationBuilder<'_> {
        self.nodes.push(ScanNode {
            name: name.into(),
            priority: DEFAULT_PRIORITY,
            skipped: None,
            payload: NodePayload::Declaration(FacetMap::default()),
        });

        DeclarationBuilder {
            node: self.last_node(),
        }
    }

    /// Declares a nested auto-loader, recursed into during scans.
    pub fn nest(&mut self, name: impl Into<String>, loader: AutoLoader) -> NestedBuilder<'_> {
        self.nodes.push(ScanNode {
            name: name.into(),
            priority: DEFAULT_PRIORITY,
            skipped: None,
            payload: NodePayload::Loader(loader),
        });

        NestedBuilder {
            node: self.last_node(),
        }
    }

    fn last_node(&mut self) -> &mut ScanNode {
        // A node was just pushed by the caller.
        let index = self.nodes.len() - 1;
        &mut self.nodes[index]
    }

    /// Visits every eligible declaration implementing the point `P`, sorted
    /// by descending priority with ties in declaration order.
    pub fn iterate<P: ExtensionPoint + ?Sized>(&self, visit: &mut dyn FnMut(&str, Arc<P>)) {
        self.iterate_erased(TypeId::of::<P>(), &mut |name, facet| {
            if let Some(value) = facet.downcast_ref::<Arc<P>>() {
                visit(name, Arc::clone(value));
            }
        });
    }

    fn iterate_erased(
        &self,
        point: TypeId,
        visit: &mut dyn FnMut(&str, &Arc<dyn Any + Send + Sync>),
    ) {
        let mut nodes: Vec<&ScanNode> = self.nodes.iter().collect();
        nodes.sort_by_key(|node| std::cmp::Reverse(node.priority));

        for node in nodes {
            if node.is_skipped_for(point) {
                continue;
            }

            match &node.payload {
                NodePayload::Loader(inner) => inner.iterate_erased(point, visit),
                NodePayload::Declaration(facets) => {
                    if let Some(facet) = facets.get(&point) {
                        visit(&node.name, facet);
                    }
                }
            }
        }
    }

    /// Registers every eligible declaration implementing `P` with the
    /// facade.
    ///
    /// A failing registration is logged with this loader's identifier and
    /// the member name, and the scan continues with the next declaration.
    pub fn register_for<P: ExtensionPoint + ?Sized>(&self, loader: &mut Loader) {
        self.iterate::<P>(&mut |name, value| {
            if let Err(err) = loader.register::<P>(value) {
                tracing::error!(loader = %self.loader_id(), member = name, %err, "failed to register entrypoint");
            }
        });
    }

    /// Repeats [`register_for`](Self::register_for) for every extension
    /// point currently known to the facade's registry.
    pub fn register(&self, loader: &mut Loader) {
        for info in loader.registry().extension_points() {
            self.iterate_erased(info.type_id, &mut |name, facet| {
                if let Err(err) = loader.register_erased(info, Arc::clone(facet)) {
                    tracing::error!(loader = %self.loader_id(), member = name, %err, "failed to register entrypoint");
                }
            });
        }
    }
}

impl Loaded for AutoLoader {
    fn loader_id(&self) -> LoaderId {
        self.id.clone()
    }
}

/// Configures one declared member value.
pub struct DeclarationBuilder<'a> {
    node: &'a mut ScanNode,
}

impl DeclarationBuilder<'_> {
    /// Sets the loading priority; higher loads sooner. Defaults to
    /// [`DEFAULT_PRIORITY`].
    pub fn priority(self, priority: i32) -> Self {
        self.node.priority = priority;
        self
    }

    /// Skips this declaration for every extension point.
    pub fn skip_all(self) -> Self {
        self.node.skipped.get_or_insert_with(FxHashSet::default);
        self
    }

    /// Skips this declaration when scanning for the point `P`.
    pub fn skip_for<P: ExtensionPoint + ?Sized>(self) -> Self {
        self.node
            .skipped
            .get_or_insert_with(FxHashSet::default)
            .insert(TypeId::of::<P>());
        self
    }

    /// Attaches the declared value's facet for the point `P`.
    ///
    /// A declaration is visited for exactly the points it exposes a facet
    /// for; values implementing several points call this once per point.
    pub fn expose<P: ExtensionPoint + ?Sized>(self, value: Arc<P>) -> Self {
        if let NodePayload::Declaration(facets) = &mut self.node.payload {
            facets.insert(TypeId::of::<P>(), Arc::new(value));
        }
        self
    }
}

/// Configures one nested auto-loader.
pub struct NestedBuilder<'a> {
    node: &'a mut ScanNode,
}

impl NestedBuilder<'_> {
    /// Sets the scan priority of the nested loader within its parent.
    pub fn priority(self, priority: i32) -> Self {
        self.node.priority = priority;
        self
    }

    /// Skips the nested loader for every extension point.
    pub fn skip_all(self) -> Self {
        self.node.skipped.get_or_insert_with(FxHashSet::default);
        self
    }

    /// Skips the nested loader when scanning for the point `P`.
    pub fn skip_for<P: ExtensionPoint + ?Sized>(self) -> Self {
        self.node
            .skipped
            .get_or_insert_with(FxHashSet::default)
            .insert(TypeId::of::<P>());
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    trait TestLoaded: Loaded {
        fn touch(&self) -> anyhow::Result<()>;
    }

    impl ExtensionPoint for dyn TestLoaded {
        const POINT_NAME: &'static str = "TestLoaded";
    }

    trait OtherLoaded: Loaded {}

    impl ExtensionPoint for dyn OtherLoaded {
        const POINT_NAME: &'static str = "OtherLoaded";
    }

    struct Item {
        id: LoaderId,
    }

    impl Item {
        fn new(path: &str) -> Arc<Self> {
            Arc::new(Self {
                id: LoaderId::new("mymod", path).unwrap(),
            })
        }
    }

    impl Loaded for Item {
        fn loader_id(&self) -> LoaderId {
            self.id.clone()
        }
    }

    impl TestLoaded for Item {
        fn touch(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl OtherLoaded for Item {}

    fn visited_paths<P: ExtensionPoint + ?Sized>(loader: &AutoLoader) -> Vec<String> {
        let mut paths = Vec::new();
        loader.iterate::<P>(&mut |_, value| paths.push(value.loader_id().path().to_owned()));
        paths
    }

    fn test_loader() -> AutoLoader {
        AutoLoader::new(LoaderId::new("mymod", "test").unwrap())
    }

    #[test]
    fn visits_in_descending_priority() {
        let mut loader = test_loader();
        loader
            .declare("a")
            .priority(-1)
            .expose::<dyn TestLoaded>(Item::new("a"));
        loader.declare("b").expose::<dyn TestLoaded>(Item::new("b"));
        loader
            .declare("c")
            .priority(1)
            .expose::<dyn TestLoaded>(Item::new("c"));

        assert_eq!(visited_paths::<dyn TestLoaded>(&loader), ["c", "b", "a"]);
    }

    #[test]
    fn equal_priorities_keep_declaration_order() {
        let mut loader = test_loader();
        for path in ["first", "second", "third"] {
            loader
                .declare(path)
                .expose::<dyn TestLoaded>(Item::new(path));
        }

        assert_eq!(
            visited_paths::<dyn TestLoaded>(&loader),
            ["first", "second", "third"]
        );
    }

    #[test]
    fn declarations_without_a_facet_are_filtered() {
        let mut loader = test_loader();
        loader
            .declare("both")
            .expose::<dyn TestLoaded>(Item::new("both"))
            .expose::<dyn OtherLoaded>(Item::new("both"));
        loader
            .declare("other_only")
            .expose::<dyn OtherLoaded>(Item::new("other_only"));

        assert_eq!(visited_paths::<dyn TestLoaded>(&loader), ["both"]);
        assert_eq!(
            visited_paths::<dyn OtherLoaded>(&loader),
            ["both", "other_only"]
        );
    }

    #[test]
    fn exclusions_apply_per_point() {
        let mut loader = test_loader();
        loader
            .declare("skipped_for_test")
            .skip_for::<dyn TestLoaded>()
            .expose::<dyn TestLoaded>(Item::new("skipped_for_test"))
            .expose::<dyn OtherLoaded>(Item::new("skipped_for_test"));
        loader
            .declare("skipped_everywhere")
            .skip_all()
            .expose::<dyn TestLoaded>(Item::new("skipped_everywhere"))
            .expose::<dyn OtherLoaded>(Item::new("skipped_everywhere"));
        loader
            .declare("kept")
            .expose::<dyn TestLoaded>(Item::new("kept"));

        assert_eq!(visited_paths::<dyn TestLoaded>(&loader), ["kept"]);
        // The per-point exclusion does not hide the value from other points.
        assert_eq!(
            visited_paths::<dyn OtherLoaded>(&loader),
            ["skipped_for_test"]
        );
    }

    #[test]
    fn nested_loaders_are_recursed_in_priority_position() {
        let mut inner = AutoLoader::new(LoaderId::new("mymod", "inner").unwrap());
        inner
            .declare("deep")
            .expose::<dyn TestLoaded>(Item::new("deep"));

        let mut loader = test_loader();
        loader
            .declare("late")
            .priority(-1)
            .expose::<dyn TestLoaded>(Item::new("late"));
        loader.nest("inner", inner).priority(1);
        loader
            .declare("middle")
            .expose::<dyn TestLoaded>(Item::new("middle"));

        assert_eq!(
            visited_paths::<dyn TestLoaded>(&loader),
            ["deep", "middle", "late"]
        );
    }

    #[test]
    fn nested_loaders_honor_exclusions() {
        let mut inner = AutoLoader::new(LoaderId::new("mymod", "inner").unwrap());
        inner
            .declare("hidden")
            .expose::<dyn TestLoaded>(Item::new("hidden"));

        let mut loader = test_loader();
        loader.nest("inner", inner).skip_for::<dyn TestLoaded>();

        assert!(visited_paths::<dyn TestLoaded>(&loader).is_empty());
    }

    fn recording_environment(facade: &mut Loader, log: &Arc<Mutex<Vec<String>>>) {
        let log = Arc::clone(log);
        facade.create_environment(move |value: &(dyn TestLoaded + 'static)| {
            log.lock()
                .unwrap()
                .push(value.loader_id().path().to_owned());
            value.touch()
        });
    }

    #[test]
    fn loaders_report_their_identifier() {
        assert_eq!(test_loader().loader_id().to_string(), "mymod:test");
    }

    #[test]
    fn a_failing_registration_does_not_stop_the_scan() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut facade = Loader::new();
        recording_environment(&mut facade, &log);
        facade.finish_bootstrap().unwrap();

        // The builder cannot produce a mismatched facet, so file one by
        // hand. It sorts first and its registration is rejected.
        let mut facets = FacetMap::default();
        facets.insert(
            TypeId::of::<dyn TestLoaded>(),
            Arc::new(String::from("not an entrypoint")) as Arc<dyn Any + Send + Sync>,
        );
        let mut loader = test_loader();
        loader.nodes.push(ScanNode {
            name: "broken".into(),
            priority: 1,
            skipped: None,
            payload: NodePayload::Declaration(facets),
        });
        loader
            .declare("good")
            .expose::<dyn TestLoaded>(Item::new("good"));

        loader.register(&mut facade);

        facade.load::<dyn TestLoaded>(&["mymod"]).unwrap();
        assert_eq!(*log.lock().unwrap(), ["good"]);
    }

    #[test]
    fn scans_for_an_unknown_point_leave_other_points_intact() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut facade = Loader::new();
        recording_environment(&mut facade, &log);
        facade.finish_bootstrap().unwrap();

        let mut loader = test_loader();
        let item = Item::new("item");
        loader
            .declare("item")
            .expose::<dyn TestLoaded>(item.clone())
            .expose::<dyn OtherLoaded>(item);

        // No environment exists for the point; every registration in the
        // scan fails and is logged, and the scan still runs to completion.
        loader.register_for::<dyn OtherLoaded>(&mut facade);
        assert!(!facade.registry().has::<dyn OtherLoaded>());

        loader.register_for::<dyn TestLoaded>(&mut facade);
        facade.load::<dyn TestLoaded>(&["mymod"]).unwrap();
        assert_eq!(*log.lock().unwrap(), ["item"]);
    }

    #[test]
    fn register_feeds_every_known_point() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut facade = Loader::new();
        {
            let log = Arc::clone(&log);
            facade.create_environment(move |value: &(dyn TestLoaded + 'static)| {
                log.lock()
                    .unwrap()
                    .push(format!("test:{}", value.loader_id().path()));
                value.touch()
            });
        }
        {
            let log = Arc::clone(&log);
            facade.create_environment(move |value: &(dyn OtherLoaded + 'static)| {
                log.lock()
                    .unwrap()
                    .push(format!("other:{}", value.loader_id().path()));
                Ok(())
            });
        }

        let mut loader = test_loader();
        let item = Item::new("item");
        loader
            .declare("item")
            .expose::<dyn TestLoaded>(item.clone())
            .expose::<dyn OtherLoaded>(item);

        loader.register(&mut facade);
        facade.finish_bootstrap().unwrap();

        facade.load::<dyn TestLoaded>(&["mymod"]).unwrap();
        facade.load::<dyn OtherLoaded>(&["mymod"]).unwrap();

        let log = log.lock().unwrap();
        assert!(log.contains(&"test:item".to_owned()));
        assert!(log.contains(&"other:item".to_owned()));
        assert_eq!(log.len(), 2);
    }
}
