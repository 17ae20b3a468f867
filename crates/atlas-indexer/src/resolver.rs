//! Dependency resolution
//!
//! Builds name and ID tables from one complete batch of projected entities,
//! then walks every callable and type subtree to emit dependency edges.
//! Tables are read-only once built, so entities resolve in parallel.

use std::collections::{HashMap, HashSet};

use atlas_core::{AtlasError, DepType, Dependency, EntityKind, SymbolTable, sort_dependencies, split_qualified};
use rayon::prelude::*;

use crate::extractor::{LanguageFrontend, RefClass};
use crate::languages::LanguageRegistry;
use crate::projection::CallGraphEntity;
use crate::syntax::SyntaxNode;

/// Knobs taken from `[resolver]` in `atlas.toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverOptions {
    /// Emit `Instantiates` instead of `Calls` for constructions.
    pub instantiates: bool,
}

/// Resolves references within one batch of entities.
pub struct DependencyResolver<'t, 'r> {
    entities: Vec<CallGraphEntity<'t>>,
    by_id: HashMap<String, usize>,
    names: SymbolTable,
    registry: &'r LanguageRegistry,
    options: ResolverOptions,
}

impl<'t, 'r> DependencyResolver<'t, 'r> {
    /// Build the lookup tables. Duplicate IDs keep the first entity.
    pub fn new(
        batch: Vec<CallGraphEntity<'t>>,
        registry: &'r LanguageRegistry,
        options: ResolverOptions,
    ) -> Self {
        let mut entities = Vec::with_capacity(batch.len());
        let mut by_id = HashMap::with_capacity(batch.len());
        for entity in batch {
            if by_id.contains_key(&entity.id) {
                tracing::warn!("Duplicate entity ID {} at {}; keeping the first", entity.id, entity.location);
                continue;
            }
            by_id.insert(entity.id.clone(), entities.len());
            entities.push(entity);
        }

        let mut names = SymbolTable::new();
        for (index, entity) in entities.iter().enumerate() {
            // Imports name other definitions; they are not definitions.
            if entity.kind == EntityKind::Import {
                continue;
            }
            names.insert(&entity.name, index);
            if entity.qualified_name != entity.name {
                names.insert(&entity.qualified_name, index);
            }
        }

        tracing::debug!(
            "Resolver tables: {} entities, {} names",
            entities.len(),
            names.len()
        );

        DependencyResolver {
            entities,
            by_id,
            names,
            registry,
            options,
        }
    }

    pub fn entities(&self) -> &[CallGraphEntity<'t>] {
        &self.entities
    }

    pub fn get(&self, id: &str) -> Option<&CallGraphEntity<'t>> {
        self.by_id.get(id).map(|i| &self.entities[*i])
    }

    /// Exact lookup, then one retry on the last segment of a qualified name.
    /// Several candidates: the most recently inserted wins.
    pub fn resolve_target(&self, name: &str, separators: &[&str]) -> Option<&CallGraphEntity<'t>> {
        self.names
            .resolve(name, separators)
            .map(|i| &self.entities[i])
    }

    /// Like [`resolve_target`](Self::resolve_target), restricted to types.
    /// A constructor sharing its class's name does not hide the class.
    pub fn resolve_owner(&self, name: &str, separators: &[&str]) -> Option<&CallGraphEntity<'t>> {
        self.names
            .resolve_where(name, separators, |i| self.entities[i].kind.is_type_like())
            .map(|i| &self.entities[i])
    }

    /// Resolve every entity in the batch, in parallel. Output is sorted.
    pub fn resolve_all(&self) -> Result<Vec<Dependency>, AtlasError> {
        let per_entity: Vec<Vec<Dependency>> = self
            .entities
            .par_iter()
            .map(|entity| self.resolve_entity(entity))
            .collect::<Result<_, _>>()?;
        let mut deps: Vec<Dependency> = per_entity.into_iter().flatten().collect();
        sort_dependencies(&mut deps);
        Ok(deps)
    }

    /// Dependencies of one entity, in discovery order.
    pub fn resolve_entity(&self, entity: &CallGraphEntity<'t>) -> Result<Vec<Dependency>, AtlasError> {
        let rules = self.registry.rules(entity.language)?;
        let mut walk = EntityWalk {
            resolver: self,
            rules,
            entity,
            seen: HashSet::new(),
            deps: Vec::new(),
        };

        if entity.kind.is_callable() {
            for decorator in rules.decorators(entity.node) {
                walk.visit_tree(decorator, false);
            }
            if let Some(body) = rules.body(entity.node) {
                walk.visit_tree(body, false);
            }
            if entity.kind == EntityKind::Method {
                walk.method_of();
            }
        } else if entity.kind.is_type_like() {
            for base in rules.base_types(entity.node) {
                walk.emit(&base.name, base.dep_type, base.node);
            }
            if let Some(body) = rules.type_body(entity.node) {
                walk.visit_tree(body, true);
            }
        }

        Ok(walk.deps)
    }
}

/// Per-entity traversal state.
struct EntityWalk<'a, 't, 'r> {
    resolver: &'a DependencyResolver<'t, 'r>,
    rules: &'r dyn LanguageFrontend,
    entity: &'a CallGraphEntity<'t>,
    /// Raw target names already emitted for this entity.
    seen: HashSet<String>,
    deps: Vec<Dependency>,
}

impl<'t> EntityWalk<'_, 't, '_> {
    /// Depth-first pre-order walk from `root`, inclusive. Type bodies stop
    /// at boundaries (methods are entities of their own) and only collect
    /// type references.
    fn visit_tree(&mut self, root: SyntaxNode<'t>, type_body: bool) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if type_body && node != root && self.rules.is_boundary(node.kind()) {
                continue;
            }
            if let Some(class) = self.rules.classify(node) {
                if !type_body || class == RefClass::TypeRef {
                    if let Some(name) = self.rules.target_name(node, class) {
                        self.emit(&name, self.dep_type_for(class), node);
                    }
                }
            }
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
    }

    fn dep_type_for(&self, class: RefClass) -> DepType {
        match class {
            RefClass::Call | RefClass::Decorator => DepType::Calls,
            RefClass::Construct if self.resolver.options.instantiates => DepType::Instantiates,
            RefClass::Construct => DepType::Calls,
            RefClass::TypeRef => DepType::UsesType,
        }
    }

    /// Filter, dedupe, split and resolve one raw reference.
    fn emit(&mut self, raw: &str, dep_type: DepType, node: SyntaxNode<'t>) {
        let raw = raw.trim();
        if raw.is_empty() || self.seen.contains(raw) {
            return;
        }
        self.seen.insert(raw.to_string());
        if self.resolver.registry.is_builtin(self.entity.language, raw) {
            return;
        }

        let separators = self.rules.separators();
        let (to_name, to_qualified) = match split_qualified(raw, separators) {
            Some((_, last)) => (last.to_string(), Some(raw.to_string())),
            None => (raw.to_string(), None),
        };
        let to_id = self
            .resolver
            .resolve_target(raw, separators)
            .map(|target| target.id.clone())
            .unwrap_or_default();

        self.deps.push(Dependency {
            from_id: self.entity.id.clone(),
            to_name,
            to_qualified,
            to_id,
            dep_type,
            location: node.location(&self.entity.file),
            optional: self.is_optional(node),
        });
    }

    /// A conditional between `node` and the nearest enclosing boundary.
    fn is_optional(&self, node: SyntaxNode<'t>) -> bool {
        for ancestor in node.ancestors() {
            let kind = ancestor.kind();
            if self.rules.is_boundary(kind) {
                return false;
            }
            if self.rules.is_conditional(kind) {
                return true;
            }
        }
        false
    }

    /// Link a method to its owning type: the nearest enclosing type
    /// declaration, else the declared receiver. No owner, no edge.
    fn method_of(&mut self) {
        let owner = self.enclosing_type_name().or_else(|| self.entity.receiver.clone());
        let Some(owner) = owner.filter(|o| !o.is_empty()) else {
            return;
        };
        let separators = self.rules.separators();
        let (to_name, to_qualified) = match split_qualified(&owner, separators) {
            Some((_, last)) => (last.to_string(), Some(owner.clone())),
            None => (owner.clone(), None),
        };
        let to_id = self
            .resolver
            .resolve_owner(&owner, separators)
            .map(|t| t.id.clone())
            .unwrap_or_default();

        self.deps.push(Dependency {
            from_id: self.entity.id.clone(),
            to_name,
            to_qualified,
            to_id,
            dep_type: DepType::MethodOf,
            location: self.entity.location.clone(),
            optional: false,
        });
    }

    fn enclosing_type_name(&self) -> Option<String> {
        for ancestor in self.entity.node.ancestors() {
            let kind = ancestor.kind();
            if self.rules.is_wrapper(kind) {
                continue;
            }
            if self.rules.is_type_declaration(kind) {
                return self.rules.type_declaration_name(ancestor);
            }
            if self.rules.is_boundary(kind) {
                return None;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::EntityWithNode;
    use crate::languages::LanguageRegistry;
    use crate::parser::parse_source;
    use crate::projection::project;
    use crate::syntax::SyntaxTree;
    use std::path::Path;

    fn parse(registry: &LanguageRegistry, file: &str, src: &str) -> SyntaxTree {
        let frontend = registry.for_path(Path::new(file)).unwrap();
        parse_source(&frontend.tree_sitter_language(), src.to_string()).unwrap()
    }

    fn extract<'t>(registry: &LanguageRegistry, tree: &'t SyntaxTree, file: &str) -> Vec<EntityWithNode<'t>> {
        registry.for_path(Path::new(file)).unwrap().extract(tree, file)
    }

    fn resolve(registry: &LanguageRegistry, items: &[EntityWithNode<'_>], options: ResolverOptions) -> Vec<Dependency> {
        let batch = project(items, registry).unwrap();
        DependencyResolver::new(batch, registry, options)
            .resolve_all()
            .unwrap()
    }

    fn id_of(items: &[EntityWithNode<'_>], name: &str) -> String {
        items
            .iter()
            .find(|i| i.entity.name == name)
            .map(|i| i.entity.id())
            .unwrap()
    }

    #[test]
    fn repeated_call_yields_one_edge() {
        let registry = LanguageRegistry::new();
        let src = "def helper():\n    return 1\n\ndef process():\n    helper()\n    helper()\n";
        let tree = parse(&registry, "app.py", src);
        let items = extract(&registry, &tree, "app.py");
        let deps = resolve(&registry, &items, ResolverOptions::default());

        assert_eq!(deps.len(), 1);
        let dep = &deps[0];
        assert_eq!(dep.from_id, id_of(&items, "process"));
        assert_eq!(dep.dep_type, DepType::Calls);
        assert_eq!(dep.to_name, "helper");
        assert_eq!(dep.to_id, id_of(&items, "helper"));
        assert_eq!(dep.location, "app.py:5");
        assert!(!dep.optional);
    }

    #[test]
    fn conditional_calls_are_optional() {
        let registry = LanguageRegistry::new();
        let src = "function f() {}\nfunction h() {}\nfunction g(cond) {\n  h();\n  if (cond) { f(); }\n}\n";
        let tree = parse(&registry, "a.js", src);
        let items = extract(&registry, &tree, "a.js");
        let deps = resolve(&registry, &items, ResolverOptions::default());

        let by_name: HashMap<_, _> = deps.iter().map(|d| (d.to_name.as_str(), d)).collect();
        assert!(by_name["f"].optional);
        assert!(!by_name["h"].optional);
    }

    #[test]
    fn closures_are_boundaries_for_optional() {
        let registry = LanguageRegistry::new();
        let src = "function f() {}\nfunction g(c) {\n  if (c) { [1].forEach(() => { f(); }); }\n}\n";
        let tree = parse(&registry, "a.js", src);
        let items = extract(&registry, &tree, "a.js");
        let deps = resolve(&registry, &items, ResolverOptions::default());
        let f = deps.iter().find(|d| d.to_name == "f").unwrap();
        assert!(!f.optional);
    }

    #[test]
    fn qualified_call_falls_back_to_last_segment() {
        let registry = LanguageRegistry::new();
        let src = "class Repo:\n    def save(self):\n        pass\n\ndef process(repo):\n    repo.save()\n";
        let tree = parse(&registry, "svc.py", src);
        let items = extract(&registry, &tree, "svc.py");
        let deps = resolve(&registry, &items, ResolverOptions::default());

        let call = deps
            .iter()
            .find(|d| d.dep_type == DepType::Calls)
            .unwrap();
        assert_eq!(call.to_name, "save");
        assert_eq!(call.to_qualified.as_deref(), Some("repo.save"));
        assert_eq!(call.to_id, id_of(&items, "save"));

        let method_of = deps
            .iter()
            .find(|d| d.dep_type == DepType::MethodOf)
            .unwrap();
        assert_eq!(method_of.to_name, "Repo");
        assert_eq!(method_of.to_id, id_of(&items, "Repo"));
    }

    #[test]
    fn builtins_are_filtered_and_unknowns_dangle() {
        let registry = LanguageRegistry::new();
        let src = "def run(items):\n    print(len(items))\n    external_thing()\n";
        let tree = parse(&registry, "r.py", src);
        let items = extract(&registry, &tree, "r.py");
        let deps = resolve(&registry, &items, ResolverOptions::default());
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].to_name, "external_thing");
        assert!(deps[0].to_id.is_empty());
    }

    #[test]
    fn chained_calls_yield_no_guess() {
        let registry = LanguageRegistry::new();
        let src = "function g(fs) {\n  make()();\n  fs[0]();\n}\n";
        let tree = parse(&registry, "c.js", src);
        let items = extract(&registry, &tree, "c.js");
        let deps = resolve(&registry, &items, ResolverOptions::default());
        let names: Vec<_> = deps.iter().map(|d| d.to_name.as_str()).collect();
        assert_eq!(names, vec!["make"]);
    }

    #[test]
    fn constructions_respect_instantiates_option() {
        let registry = LanguageRegistry::new();
        let src = "class Box {}\nfunction build() { return new Box(); }\n";
        let tree = parse(&registry, "b.ts", src);
        let items = extract(&registry, &tree, "b.ts");

        let calls = resolve(&registry, &items, ResolverOptions::default());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].dep_type, DepType::Calls);

        let inst = resolve(&registry, &items, ResolverOptions { instantiates: true });
        assert_eq!(inst[0].dep_type, DepType::Instantiates);
        assert_eq!(inst[0].to_id, id_of(&items, "Box"));
    }

    #[test]
    fn empty_batch_is_not_an_error() {
        let registry = LanguageRegistry::new();
        let resolver = DependencyResolver::new(Vec::new(), &registry, ResolverOptions::default());
        assert!(resolver.resolve_all().unwrap().is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let registry = LanguageRegistry::new();
        let src = "def a():\n    pass\n";
        let tree = parse(&registry, "d.py", src);
        let items = extract(&registry, &tree, "d.py");
        let mut batch = project(&items, &registry).unwrap();
        batch.push(batch[0].clone());
        let resolver = DependencyResolver::new(batch, &registry, ResolverOptions::default());
        assert_eq!(resolver.entities().len(), 1);
        assert!(resolver.get(&items[0].entity.id()).is_some());
    }
}
