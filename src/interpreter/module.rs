//! Source text module records
//!
//! Hosts register module sources by specifier. Loading parses a module and,
//! recursively, everything it imports; linking creates the module
//! environments with indirect import bindings; evaluation runs each body
//! once, depth first, tolerating cycles. Specifiers are matched exactly.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{ExportKind, ImportSpecifier, Program, Statement, DEFAULT_EXPORT_BINDING};
use crate::error::{ErrorKind, JsError, JsResult};
use crate::interpreter::realm::RealmId;
use crate::interpreter::{EnvId, ExecutionContext, Interpreter, ObjectId, ScriptOrModule};
use crate::parser::parse_module;
use crate::value::{CheapClone, JsString, Value};

/// Index of a module in the interpreter's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(usize);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// [[Status]]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    Unlinked,
    Linking,
    Linked,
    Evaluating,
    Evaluated,
}

/// ImportEntry Record; `import_name` is `None` for `import * as local`.
#[derive(Debug, Clone)]
struct ImportEntry {
    module_request: JsString,
    import_name: Option<JsString>,
    local_name: JsString,
}

/// `export { local as exported }` of a binding declared in this module.
#[derive(Debug, Clone)]
struct LocalExport {
    export_name: JsString,
    local_name: JsString,
}

/// Re-export of another module's binding; `import_name` is `None` for
/// `export * as name from`.
#[derive(Debug, Clone)]
struct IndirectExport {
    export_name: JsString,
    module_request: JsString,
    import_name: Option<JsString>,
}

/// What ResolveExport found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedBinding {
    Binding { module: ModuleId, name: JsString },
    Namespace(ModuleId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Found(ResolvedBinding),
    NotFound,
    Ambiguous,
}

struct SourceTextModule {
    specifier: String,
    program: Rc<Program>,
    realm: RealmId,
    status: ModuleStatus,
    environment: Option<EnvId>,
    namespace: Option<ObjectId>,
    requested: Vec<JsString>,
    loaded: FxHashMap<JsString, ModuleId>,
    imports: Vec<ImportEntry>,
    local_exports: Vec<LocalExport>,
    indirect_exports: Vec<IndirectExport>,
    star_exports: Vec<JsString>,
    dfs_index: usize,
    dfs_ancestor_index: usize,
    evaluation_error: Option<JsError>,
}

/// Registered sources and the modules loaded from them.
#[derive(Default)]
pub(crate) struct ModuleRegistry {
    sources: FxHashMap<String, Rc<str>>,
    records: Vec<SourceTextModule>,
    by_specifier: FxHashMap<String, ModuleId>,
}

impl ModuleRegistry {
    pub(crate) fn specifier(&self, id: ModuleId) -> Option<String> {
        self.records.get(id.0).map(|m| m.specifier.clone())
    }

    pub(crate) fn clear(&mut self) {
        self.sources.clear();
        self.records.clear();
        self.by_specifier.clear();
    }
}

/// A module's evaluation error, rethrown on every later evaluation.
fn replay(error: &JsError) -> JsError {
    match error {
        JsError::Thrown(exception) => JsError::Thrown(exception.clone()),
        JsError::Native { kind, message } => JsError::native(*kind, message.clone()),
        JsError::SyntaxError { message, location } => JsError::SyntaxError {
            message: message.clone(),
            location: location.clone(),
        },
        other => JsError::internal(other.to_string()),
    }
}

/// ParseModule: the module requests and import/export entries of a body.
fn collect_entries(program: &Program, record: &mut SourceTextModule) {
    let request = |record: &mut SourceTextModule, specifier: &JsString| {
        if !record.requested.contains(specifier) {
            record.requested.push(specifier.cheap_clone());
        }
    };
    let mut bound = Vec::new();
    for stmt in &program.body {
        match stmt {
            Statement::Import(import) => {
                request(record, &import.source);
                for spec in &import.specifiers {
                    let (import_name, local) = match spec {
                        ImportSpecifier::Named { local, imported } => (Some(imported.cheap_clone()), local),
                        ImportSpecifier::Default { local } => (Some(JsString::from("default")), local),
                        ImportSpecifier::Namespace { local } => (None, local),
                    };
                    record.imports.push(ImportEntry {
                        module_request: import.source.cheap_clone(),
                        import_name,
                        local_name: local.name.cheap_clone(),
                    });
                }
            }
            Statement::Export(export) => match &export.kind {
                ExportKind::Declaration(decl) => {
                    bound.clear();
                    declaration_names(decl, &mut bound);
                    for name in &bound {
                        record.local_exports.push(LocalExport {
                            export_name: name.cheap_clone(),
                            local_name: name.cheap_clone(),
                        });
                    }
                }
                ExportKind::DefaultDeclaration(decl) => {
                    bound.clear();
                    declaration_names(decl, &mut bound);
                    let local_name = bound
                        .first()
                        .cloned()
                        .unwrap_or_else(|| JsString::from(DEFAULT_EXPORT_BINDING));
                    record.local_exports.push(LocalExport {
                        export_name: JsString::from("default"),
                        local_name,
                    });
                }
                ExportKind::DefaultExpression(_) => record.local_exports.push(LocalExport {
                    export_name: JsString::from("default"),
                    local_name: JsString::from(DEFAULT_EXPORT_BINDING),
                }),
                ExportKind::Named {
                    specifiers,
                    source: None,
                } => {
                    for spec in specifiers {
                        record.local_exports.push(LocalExport {
                            export_name: spec.exported.cheap_clone(),
                            local_name: spec.local.cheap_clone(),
                        });
                    }
                }
                ExportKind::Named {
                    specifiers,
                    source: Some(source),
                } => {
                    request(record, source);
                    for spec in specifiers {
                        record.indirect_exports.push(IndirectExport {
                            export_name: spec.exported.cheap_clone(),
                            module_request: source.cheap_clone(),
                            import_name: Some(spec.local.cheap_clone()),
                        });
                    }
                }
                ExportKind::All { exported, source } => {
                    request(record, source);
                    match exported {
                        Some(name) => record.indirect_exports.push(IndirectExport {
                            export_name: name.cheap_clone(),
                            module_request: source.cheap_clone(),
                            import_name: None,
                        }),
                        None => record.star_exports.push(source.cheap_clone()),
                    }
                }
            },
            _ => {}
        }
    }

    // `export { x }` naming an imported binding re-exports it.
    let imports = record.imports.clone();
    record.local_exports.retain(|export| {
        let Some(import) = imports.iter().find(|i| i.local_name == export.local_name) else {
            return true;
        };
        record.indirect_exports.push(IndirectExport {
            export_name: export.export_name.cheap_clone(),
            module_request: import.module_request.cheap_clone(),
            import_name: import.import_name.clone(),
        });
        false
    });
}

fn declaration_names(stmt: &Statement, out: &mut Vec<JsString>) {
    match stmt {
        Statement::VariableDeclaration(decl) => {
            for declarator in &decl.declarations {
                crate::hoist::bound_names(&declarator.id, out);
            }
        }
        Statement::FunctionDeclaration(f) => out.push(Interpreter::declared_function_name(f)),
        Statement::ClassDeclaration(class) => out.push(
            class
                .id
                .as_ref()
                .map(|id| id.name.cheap_clone())
                .unwrap_or_else(|| JsString::from(DEFAULT_EXPORT_BINDING)),
        ),
        _ => {}
    }
}

impl Interpreter {
    // ============ REGISTRY ============

    fn with_module<R>(&self, id: ModuleId, f: impl FnOnce(&SourceTextModule) -> R) -> JsResult<R> {
        self.modules
            .borrow()
            .records
            .get(id.0)
            .map(f)
            .ok_or_else(|| JsError::internal("stale module handle"))
    }

    fn with_module_mut<R>(&self, id: ModuleId, f: impl FnOnce(&mut SourceTextModule) -> R) -> JsResult<R> {
        self.modules
            .borrow_mut()
            .records
            .get_mut(id.0)
            .map(f)
            .ok_or_else(|| JsError::internal("stale module handle"))
    }

    /// Register the source text of `specifier`. A module already loaded
    /// under that specifier keeps its record.
    pub fn register_module_source(&self, specifier: &str, source: &str) {
        self.modules
            .borrow_mut()
            .sources
            .insert(specifier.to_string(), Rc::from(source));
    }

    /// The environment of a linked module.
    pub(crate) fn module_environment(&self, id: ModuleId) -> JsResult<Option<EnvId>> {
        self.with_module(id, |m| m.environment)
    }

    pub fn module_status(&self, id: ModuleId) -> JsResult<ModuleStatus> {
        self.with_module(id, |m| m.status)
    }

    fn requested_module(&self, id: ModuleId, request: &JsString) -> JsResult<ModuleId> {
        self.with_module(id, |m| m.loaded.get(request).copied())?
            .ok_or_else(|| JsError::internal(format!("module request '{}' was not loaded", request)))
    }

    // ============ LOADING ============

    /// Parse `specifier` and everything it imports, transitively.
    pub fn load_module(&self, specifier: &str) -> JsResult<ModuleId> {
        if let Some(id) = self.modules.borrow().by_specifier.get(specifier) {
            return Ok(*id);
        }
        let source = self.modules.borrow().sources.get(specifier).cloned();
        let Some(source) = source else {
            return self.throw(ErrorKind::Error, format!("Cannot find module '{}'", specifier));
        };
        let program = {
            let mut dict = self.string_dict().borrow_mut();
            parse_module(&source, &mut dict)?
        };
        let mut record = SourceTextModule {
            specifier: specifier.to_string(),
            program: Rc::new(program),
            realm: self.current_realm_id(),
            status: ModuleStatus::Unlinked,
            environment: None,
            namespace: None,
            requested: Vec::new(),
            loaded: FxHashMap::default(),
            imports: Vec::new(),
            local_exports: Vec::new(),
            indirect_exports: Vec::new(),
            star_exports: Vec::new(),
            dfs_index: 0,
            dfs_ancestor_index: 0,
            evaluation_error: None,
        };
        let program = record.program.clone();
        collect_entries(&program, &mut record);
        let requested = record.requested.clone();
        let id = {
            let mut registry = self.modules.borrow_mut();
            let id = ModuleId(registry.records.len());
            registry.records.push(record);
            registry.by_specifier.insert(specifier.to_string(), id);
            id
        };
        tracing::debug!(target: "ecmavm::module", specifier, id = id.0, requests = requested.len(), "loaded module");
        for request in requested {
            let target = self.load_module(request.as_str())?;
            self.with_module_mut(id, |m| m.loaded.insert(request, target))?;
        }
        Ok(id)
    }

    // ============ EXPORT RESOLUTION ============

    /// GetExportedNames(exportStarSet)
    fn get_exported_names(&self, module: ModuleId, visited: &mut Vec<ModuleId>) -> JsResult<Vec<JsString>> {
        if visited.contains(&module) {
            return Ok(Vec::new());
        }
        visited.push(module);
        let (mut names, stars) = self.with_module(module, |m| {
            let names: Vec<JsString> = m
                .local_exports
                .iter()
                .map(|e| e.export_name.cheap_clone())
                .chain(m.indirect_exports.iter().map(|e| e.export_name.cheap_clone()))
                .collect();
            (names, m.star_exports.clone())
        })?;
        for request in stars {
            let requested = self.requested_module(module, &request)?;
            for name in self.get_exported_names(requested, visited)? {
                if name != "default" && !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    /// ResolveExport(exportName, resolveSet)
    fn resolve_export(
        &self,
        module: ModuleId,
        export_name: &JsString,
        resolve_set: &mut Vec<(ModuleId, JsString)>,
    ) -> JsResult<Resolution> {
        if resolve_set
            .iter()
            .any(|(m, name)| *m == module && name == export_name)
        {
            // Circular import request.
            return Ok(Resolution::NotFound);
        }
        resolve_set.push((module, export_name.cheap_clone()));

        let (local, indirect, stars) = self.with_module(module, |m| {
            (
                m.local_exports
                    .iter()
                    .find(|e| e.export_name == *export_name)
                    .map(|e| e.local_name.cheap_clone()),
                m.indirect_exports
                    .iter()
                    .find(|e| e.export_name == *export_name)
                    .cloned(),
                m.star_exports.clone(),
            )
        })?;
        if let Some(name) = local {
            return Ok(Resolution::Found(ResolvedBinding::Binding { module, name }));
        }
        if let Some(entry) = indirect {
            let imported = self.requested_module(module, &entry.module_request)?;
            return match entry.import_name {
                None => Ok(Resolution::Found(ResolvedBinding::Namespace(imported))),
                Some(name) => self.resolve_export(imported, &name, resolve_set),
            };
        }
        if *export_name == "default" {
            return Ok(Resolution::NotFound);
        }
        let mut star_resolution: Option<ResolvedBinding> = None;
        for request in stars {
            let imported = self.requested_module(module, &request)?;
            match self.resolve_export(imported, export_name, resolve_set)? {
                Resolution::Ambiguous => return Ok(Resolution::Ambiguous),
                Resolution::NotFound => {}
                Resolution::Found(resolution) => match &star_resolution {
                    None => star_resolution = Some(resolution),
                    Some(existing) if *existing != resolution => return Ok(Resolution::Ambiguous),
                    Some(_) => {}
                },
            }
        }
        Ok(star_resolution.map_or(Resolution::NotFound, Resolution::Found))
    }

    /// The value of export `name` as seen through a namespace object.
    pub(crate) fn module_export_value(&self, module: ModuleId, name: &JsString) -> JsResult<Value> {
        match self.resolve_export(module, name, &mut Vec::new())? {
            Resolution::Found(ResolvedBinding::Namespace(target)) => {
                Ok(Value::Object(self.get_module_namespace(target)?))
            }
            Resolution::Found(ResolvedBinding::Binding { module, name }) => {
                let Some(env) = self.module_environment(module)? else {
                    return Err(JsError::reference_error(format!(
                        "Cannot access '{}' before initialization",
                        name
                    )));
                };
                self.get_binding_value(env, &name, true)
            }
            Resolution::NotFound | Resolution::Ambiguous => Ok(Value::Undefined),
        }
    }

    /// GetModuleNamespace(module)
    pub fn get_module_namespace(&self, module: ModuleId) -> JsResult<ObjectId> {
        if let Some(namespace) = self.with_module(module, |m| m.namespace)? {
            return Ok(namespace);
        }
        let mut unambiguous = Vec::new();
        for name in self.get_exported_names(module, &mut Vec::new())? {
            if let Resolution::Found(_) = self.resolve_export(module, &name, &mut Vec::new())? {
                unambiguous.push(name);
            }
        }
        let namespace = self.module_namespace_create(module, unambiguous)?;
        self.with_module_mut(module, |m| m.namespace = Some(namespace))?;
        Ok(namespace)
    }

    // ============ LINKING ============

    /// Link(): link `module` and everything it depends on.
    pub fn link_module(&self, module: ModuleId) -> JsResult<()> {
        let mut stack = Vec::new();
        if let Err(error) = self.inner_module_linking(module, &mut stack, 0) {
            for m in stack {
                self.with_module_mut(m, |m| {
                    m.status = ModuleStatus::Unlinked;
                    m.environment = None;
                })?;
            }
            return Err(error);
        }
        Ok(())
    }

    fn inner_module_linking(&self, module: ModuleId, stack: &mut Vec<ModuleId>, index: usize) -> JsResult<usize> {
        let status = self.with_module(module, |m| m.status)?;
        if status != ModuleStatus::Unlinked {
            return Ok(index);
        }
        self.with_module_mut(module, |m| {
            m.status = ModuleStatus::Linking;
            m.dfs_index = index;
            m.dfs_ancestor_index = index;
        })?;
        let mut index = index + 1;
        stack.push(module);
        let requested = self.with_module(module, |m| m.requested.clone())?;
        for request in requested {
            let required = self.requested_module(module, &request)?;
            index = self.inner_module_linking(required, stack, index)?;
            let (status, ancestor) = self.with_module(required, |m| (m.status, m.dfs_ancestor_index))?;
            if status == ModuleStatus::Linking {
                self.with_module_mut(module, |m| {
                    m.dfs_ancestor_index = m.dfs_ancestor_index.min(ancestor);
                })?;
            }
        }
        self.initialize_module_environment(module)?;
        let (dfs_index, ancestor) = self.with_module(module, |m| (m.dfs_index, m.dfs_ancestor_index))?;
        if dfs_index == ancestor {
            while let Some(done) = stack.pop() {
                self.with_module_mut(done, |m| m.status = ModuleStatus::Linked)?;
                if done == module {
                    break;
                }
            }
        }
        Ok(index)
    }

    fn module_context(&self, module: ModuleId, env: EnvId, realm: RealmId) -> ExecutionContext {
        ExecutionContext {
            lexical_environment: env,
            variable_environment: env,
            function: None,
            realm,
            script_or_module: Some(ScriptOrModule::Module(module)),
            strict: true,
            coroutine: None,
            caller_position: Default::default(),
        }
    }

    /// InitializeEnvironment()
    fn initialize_module_environment(&self, module: ModuleId) -> JsResult<()> {
        let (indirect, imports, realm, program, specifier) = self.with_module(module, |m| {
            (
                m.indirect_exports.clone(),
                m.imports.clone(),
                m.realm,
                m.program.clone(),
                m.specifier.clone(),
            )
        })?;
        for entry in &indirect {
            if !matches!(
                self.resolve_export(module, &entry.export_name, &mut Vec::new())?,
                Resolution::Found(_)
            ) {
                return Err(JsError::runtime_syntax_error(format!(
                    "The requested module '{}' does not provide an export named '{}'",
                    entry.module_request, entry.export_name
                )));
            }
        }

        let global_env = self.realm(realm)?.global_env;
        let env = self.new_module_environment(global_env);
        self.with_module_mut(module, |m| m.environment = Some(env))?;

        for import in &imports {
            let imported = self.requested_module(module, &import.module_request)?;
            let resolution = match &import.import_name {
                None => ResolvedBinding::Namespace(imported),
                Some(name) => match self.resolve_export(imported, name, &mut Vec::new())? {
                    Resolution::Found(resolution) => resolution,
                    Resolution::NotFound => {
                        return Err(JsError::runtime_syntax_error(format!(
                            "The requested module '{}' does not provide an export named '{}'",
                            import.module_request, name
                        )));
                    }
                    Resolution::Ambiguous => {
                        return Err(JsError::runtime_syntax_error(format!(
                            "The requested module '{}' contains conflicting star exports for name '{}'",
                            import.module_request, name
                        )));
                    }
                },
            };
            match resolution {
                ResolvedBinding::Namespace(target) => {
                    let namespace = self.get_module_namespace(target)?;
                    self.create_immutable_binding(env, &import.local_name, true)?;
                    self.initialize_binding(env, &import.local_name, Value::Object(namespace))?;
                }
                ResolvedBinding::Binding { module: target, name } => {
                    self.create_import_binding(env, import.local_name.cheap_clone(), target, name)?;
                }
            }
        }

        self.with_context(self.module_context(module, env, realm), || {
            let scope = &program.scope;
            let mut declared: FxHashSet<JsString> = FxHashSet::default();
            for name in &scope.var_names {
                if declared.insert(name.cheap_clone()) {
                    self.create_mutable_binding(env, name, false)?;
                    self.initialize_binding(env, name, Value::Undefined)?;
                }
            }
            for binding in &scope.lexical {
                if binding.constant {
                    self.create_immutable_binding(env, &binding.name, true)?;
                } else {
                    self.create_mutable_binding(env, &binding.name, false)?;
                }
            }
            for function in &scope.functions {
                let name = Self::declared_function_name(function);
                let fo = self.instantiate_function_object(function, env)?;
                if !declared.contains(&name) {
                    self.create_mutable_binding(env, &name, false)?;
                }
                self.initialize_binding(env, &name, Value::Object(fo))?;
            }
            Ok(())
        })?;
        tracing::debug!(target: "ecmavm::module", specifier = specifier.as_str(), "linked module");
        Ok(())
    }

    // ============ EVALUATION ============

    /// Evaluate(): run `module` and its dependencies, depth first. A failed
    /// evaluation is remembered and rethrown by later calls.
    pub fn evaluate_module(&self, module: ModuleId) -> JsResult<()> {
        let mut stack = Vec::new();
        if let Err(error) = self.inner_module_evaluation(module, &mut stack, 0) {
            for m in stack {
                self.with_module_mut(m, |m| {
                    m.status = ModuleStatus::Evaluated;
                    m.evaluation_error = Some(replay(&error));
                })?;
            }
            return Err(error);
        }
        Ok(())
    }

    fn inner_module_evaluation(&self, module: ModuleId, stack: &mut Vec<ModuleId>, index: usize) -> JsResult<usize> {
        let (status, error) = self.with_module(module, |m| (m.status, m.evaluation_error.as_ref().map(replay)))?;
        match status {
            ModuleStatus::Evaluated => {
                return match error {
                    Some(error) => Err(error),
                    None => Ok(index),
                };
            }
            ModuleStatus::Evaluating => return Ok(index),
            ModuleStatus::Linked => {}
            ModuleStatus::Unlinked | ModuleStatus::Linking => {
                return Err(JsError::internal("evaluating a module that is not linked"));
            }
        }
        self.with_module_mut(module, |m| {
            m.status = ModuleStatus::Evaluating;
            m.dfs_index = index;
            m.dfs_ancestor_index = index;
        })?;
        let mut index = index + 1;
        stack.push(module);
        let requested = self.with_module(module, |m| m.requested.clone())?;
        for request in requested {
            let required = self.requested_module(module, &request)?;
            index = self.inner_module_evaluation(required, stack, index)?;
            let (status, ancestor) = self.with_module(required, |m| (m.status, m.dfs_ancestor_index))?;
            if status == ModuleStatus::Evaluating {
                self.with_module_mut(module, |m| {
                    m.dfs_ancestor_index = m.dfs_ancestor_index.min(ancestor);
                })?;
            }
        }
        self.execute_module(module)?;
        let (dfs_index, ancestor) = self.with_module(module, |m| (m.dfs_index, m.dfs_ancestor_index))?;
        if dfs_index == ancestor {
            while let Some(done) = stack.pop() {
                self.with_module_mut(done, |m| m.status = ModuleStatus::Evaluated)?;
                if done == module {
                    break;
                }
            }
        }
        Ok(index)
    }

    /// ExecuteModule(): evaluate the body in the module's context.
    fn execute_module(&self, module: ModuleId) -> JsResult<()> {
        let (env, realm, program, specifier) =
            self.with_module(module, |m| (m.environment, m.realm, m.program.clone(), m.specifier.clone()))?;
        let env = env.ok_or_else(|| JsError::internal("module evaluated before linking"))?;
        tracing::debug!(target: "ecmavm::module", specifier = specifier.as_str(), "evaluating module");
        self.with_context(self.module_context(module, env, realm), || {
            self.run_sync(self.evaluate_statement_list(&program.body)).map(drop)
        })
    }

    /// Load, link and evaluate `specifier`; the result is its namespace.
    pub fn import_module(&self, specifier: &str) -> JsResult<ObjectId> {
        let module = self.load_module(specifier)?;
        self.link_module(module)?;
        self.evaluate_module(module)?;
        self.get_module_namespace(module)
    }
}
