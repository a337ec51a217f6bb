//! file: core/src/tree/builder.rs
//! description: incremental construction of `Program` trees.
//!
//! `ProgramBuilder` keeps the arena invariants (`decls[i].id == i`, members
//! registered on their parent, module-scope declarations listed in
//! `top_level`) so front ends and tests do not have to. The free functions
//! at the bottom build the most common expression shapes.

use crate::location::Location;

use super::decl::*;
use super::expr::{Argument, Expr, ExprKind, Substitution};
use super::pattern::Pattern;
use super::stmt::{BraceElement, Stmt};
use super::types::Type;
use super::Program;

/// Parameter description used by the builder: `(label, name, type)`.
pub type ParamSpec<'a> = (Option<&'a str>, &'a str, Type);

#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new(module: &str) -> Self {
        ProgramBuilder { program: Program::new(module) }
    }

    pub fn module(&self) -> &str {
        &self.program.module
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn finish(self) -> Program {
        self.program
    }

    pub fn get_mut(&mut self, id: DeclId) -> Option<&mut Decl> {
        self.program.decls.get_mut(id.index())
    }

    /// Add a declaration to the arena and register it with its parent.
    ///
    /// Declarations of the program's own module without a parent become
    /// top-level; members of nominals and extensions are appended to the
    /// parent's member list.
    pub fn declare(&mut self, module: &str, parent: Option<DeclId>, name: &str, kind: DeclKind) -> DeclId {
        let id = self.insert(module, parent, name, kind);
        match parent {
            None if module == self.program.module => self.program.top_level.push(id),
            Some(p) => {
                if let Some(parent_decl) = self.get_mut(p) {
                    match &mut parent_decl.kind {
                        DeclKind::Nominal(n) => n.members.push(id),
                        DeclKind::Extension(e) => e.members.push(id),
                        _ => {}
                    }
                }
            }
            None => {}
        }
        id
    }

    /// Add a declaration to the arena without listing it anywhere. Used for
    /// variables, accessors and parameters, which emit through their owner.
    pub fn insert(&mut self, module: &str, parent: Option<DeclId>, name: &str, kind: DeclKind) -> DeclId {
        let id = DeclId(self.program.decls.len());
        self.program.decls.push(Decl {
            id,
            name: name.to_string(),
            module: module.to_string(),
            parent,
            location: None,
            span: None,
            overridden: None,
            requirements: Vec::new(),
            is_static: false,
            is_implicit: false,
            visibility: Visibility::Internal,
            kind,
        });
        id
    }

    fn own_module(&self) -> String {
        self.program.module.clone()
    }

    // ------- Types -------

    pub fn nominal(&mut self, parent: Option<DeclId>, name: &str, kind: NominalKind) -> DeclId {
        let module = self.own_module();
        self.nominal_in(&module, parent, name, kind)
    }

    pub fn nominal_in(&mut self, module: &str, parent: Option<DeclId>, name: &str, kind: NominalKind) -> DeclId {
        self.declare(
            module,
            parent,
            name,
            DeclKind::Nominal(NominalDecl {
                kind,
                generic_params: Vec::new(),
                superclass: None,
                protocols: Vec::new(),
                members: Vec::new(),
            }),
        )
    }

    pub fn extension(&mut self, extended: Type) -> DeclId {
        let module = self.own_module();
        self.declare(
            &module,
            None,
            "",
            DeclKind::Extension(ExtensionDecl { extended, protocols: Vec::new(), members: Vec::new() }),
        )
    }

    /// Declare a generic parameter on a nominal or function.
    pub fn generic_param(&mut self, owner: DeclId, name: &str) -> DeclId {
        let module = self.module_of(owner);
        let id = self.insert(&module, Some(owner), name, DeclKind::GenericParam);
        if let Some(d) = self.get_mut(owner) {
            match &mut d.kind {
                DeclKind::Nominal(n) => n.generic_params.push(id),
                DeclKind::Function(f) => f.generic_params.push(id),
                _ => {}
            }
        }
        id
    }

    pub fn associated_type(&mut self, protocol: DeclId, name: &str) -> DeclId {
        let module = self.module_of(protocol);
        self.declare(&module, Some(protocol), name, DeclKind::AssociatedType)
    }

    pub fn type_alias(&mut self, parent: Option<DeclId>, name: &str, underlying: Type) -> DeclId {
        let module = self.own_module();
        self.declare(&module, parent, name, DeclKind::TypeAlias { underlying })
    }

    /// Record a protocol conformance (or protocol inheritance).
    pub fn conform(&mut self, decl: DeclId, protocol: Type) {
        if let Some(d) = self.get_mut(decl) {
            match &mut d.kind {
                DeclKind::Nominal(n) => n.protocols.push(protocol),
                DeclKind::Extension(e) => e.protocols.push(protocol),
                _ => {}
            }
        }
    }

    pub fn set_superclass(&mut self, decl: DeclId, superclass: Type) {
        if let Some(DeclKind::Nominal(n)) = self.get_mut(decl).map(|d| &mut d.kind) {
            n.superclass = Some(superclass);
        }
    }

    // ------- Functions -------

    pub fn function(&mut self, parent: Option<DeclId>, name: &str, params: Vec<ParamSpec<'_>>, result: Type) -> DeclId {
        let module = self.own_module();
        self.function_in(&module, parent, name, FunctionKind::Func, params, result)
    }

    pub fn initializer(&mut self, parent: DeclId, params: Vec<ParamSpec<'_>>) -> DeclId {
        let module = self.module_of(parent);
        let result = Type::nominal(parent);
        self.function_in(
            &module,
            Some(parent),
            "init",
            FunctionKind::Initializer { memberwise: false, failable: false },
            params,
            result,
        )
    }

    pub fn operator(
        &mut self,
        parent: Option<DeclId>,
        name: &str,
        fixity: Fixity,
        params: Vec<ParamSpec<'_>>,
        result: Type,
    ) -> DeclId {
        let module = match parent {
            Some(p) => self.module_of(p),
            None => self.own_module(),
        };
        let id = self.function_in(&module, parent, name, FunctionKind::Func, params, result);
        if let Some(d) = self.get_mut(id) {
            d.is_static = parent.is_some();
            if let DeclKind::Function(f) = &mut d.kind {
                f.operator = Some(fixity);
            }
        }
        id
    }

    pub fn function_in(
        &mut self,
        module: &str,
        parent: Option<DeclId>,
        name: &str,
        kind: FunctionKind,
        params: Vec<ParamSpec<'_>>,
        result: Type,
    ) -> DeclId {
        let id = self.declare(
            module,
            parent,
            name,
            DeclKind::Function(FunctionDecl {
                kind,
                operator: None,
                generic_params: Vec::new(),
                params: Vec::new(),
                result,
                body: None,
                is_mutating: false,
                throws: false,
            }),
        );
        let param_ids: Vec<DeclId> = params
            .into_iter()
            .map(|(label, pname, ty)| self.param_in(module, id, label, pname, ty))
            .collect();
        if let Some(DeclKind::Function(f)) = self.get_mut(id).map(|d| &mut d.kind) {
            f.params = param_ids;
        }
        id
    }

    fn param_in(&mut self, module: &str, owner: DeclId, label: Option<&str>, name: &str, ty: Type) -> DeclId {
        self.insert(
            module,
            Some(owner),
            name,
            DeclKind::Param(ParamDecl {
                label: label.map(|l| l.to_string()),
                ty,
                is_inout: false,
                is_variadic: false,
                is_autoclosure: false,
                default: None,
            }),
        )
    }

    pub fn param_of(&self, function: DeclId, index: usize) -> Option<DeclId> {
        self.program.get_decl(function).and_then(|d| d.params().get(index).copied())
    }

    pub fn set_body(&mut self, function: DeclId, body: Stmt) {
        if let Some(DeclKind::Function(f)) = self.get_mut(function).map(|d| &mut d.kind) {
            f.body = Some(body);
        }
    }

    pub fn set_mutating(&mut self, function: DeclId) {
        if let Some(DeclKind::Function(f)) = self.get_mut(function).map(|d| &mut d.kind) {
            f.is_mutating = true;
        }
    }

    pub fn set_failable(&mut self, function: DeclId) {
        if let Some(DeclKind::Function(f)) = self.get_mut(function).map(|d| &mut d.kind) {
            if let FunctionKind::Initializer { failable, .. } = &mut f.kind {
                *failable = true;
            }
        }
    }

    pub fn set_inout(&mut self, param: DeclId) {
        if let Some(DeclKind::Param(p)) = self.get_mut(param).map(|d| &mut d.kind) {
            p.is_inout = true;
        }
    }

    pub fn set_variadic(&mut self, param: DeclId) {
        if let Some(DeclKind::Param(p)) = self.get_mut(param).map(|d| &mut d.kind) {
            p.is_variadic = true;
        }
    }

    pub fn set_default(&mut self, param: DeclId, default: Expr) {
        if let Some(DeclKind::Param(p)) = self.get_mut(param).map(|d| &mut d.kind) {
            p.default = Some(default);
        }
    }

    /// Add an accessor or observer for a property or subscript. Setters
    /// and `willSet` get an implicit `newValue` parameter, `didSet` an
    /// `oldValue` one.
    pub fn accessor(&mut self, storage: DeclId, kind: AccessorKind, body: Stmt) -> DeclId {
        let module = self.module_of(storage);
        let parent = self.program.get_decl(storage).and_then(|d| d.parent);
        let result = match self.program.get_decl(storage).map(|d| &d.kind) {
            Some(DeclKind::Var(v)) if kind == AccessorKind::Get => v.ty.clone(),
            Some(DeclKind::Subscript(s)) if kind == AccessorKind::Get => s.result.clone(),
            _ => Type::void(),
        };
        let id = self.insert(
            &module,
            parent,
            "",
            DeclKind::Function(FunctionDecl {
                kind: FunctionKind::Accessor { kind, storage },
                operator: None,
                generic_params: Vec::new(),
                params: Vec::new(),
                result,
                body: Some(body),
                is_mutating: false,
                throws: false,
            }),
        );
        let is_static = self.program.get_decl(storage).map(|d| d.is_static).unwrap_or(false);
        if let Some(d) = self.get_mut(id) {
            d.is_static = is_static;
        }
        let value_param = match kind {
            AccessorKind::Get => None,
            AccessorKind::Set | AccessorKind::WillSet => Some("newValue"),
            AccessorKind::DidSet => Some("oldValue"),
        };
        if let Some(pname) = value_param {
            let ty = match self.program.get_decl(storage).map(|d| &d.kind) {
                Some(DeclKind::Var(v)) => v.ty.clone(),
                Some(DeclKind::Subscript(s)) => s.result.clone(),
                _ => Type::void(),
            };
            let param = self.param_in(&module, id, None, pname, ty);
            if let Some(DeclKind::Function(f)) = self.get_mut(id).map(|d| &mut d.kind) {
                f.params.push(param);
            }
        }
        match self.get_mut(storage).map(|d| &mut d.kind) {
            Some(DeclKind::Var(v)) => v.accessors.push(id),
            Some(DeclKind::Subscript(s)) => s.accessors.push(id),
            _ => {}
        }
        id
    }

    pub fn subscript(&mut self, parent: DeclId, params: Vec<ParamSpec<'_>>, result: Type) -> DeclId {
        let module = self.module_of(parent);
        let id = self.declare(
            &module,
            Some(parent),
            "subscript",
            DeclKind::Subscript(SubscriptDecl { params: Vec::new(), result, accessors: Vec::new() }),
        );
        let param_ids: Vec<DeclId> = params
            .into_iter()
            .map(|(label, pname, ty)| self.param_in(&module, id, label, pname, ty))
            .collect();
        if let Some(DeclKind::Subscript(s)) = self.get_mut(id).map(|d| &mut d.kind) {
            s.params = param_ids;
        }
        id
    }

    // ------- Storage -------

    pub fn var(&mut self, parent: Option<DeclId>, name: &str, ty: Type, is_let: bool) -> DeclId {
        let module = match parent {
            Some(p) => self.module_of(p),
            None => self.own_module(),
        };
        self.insert(&module, parent, name, DeclKind::Var(VarDecl { ty, is_let, accessors: Vec::new() }))
    }

    /// Declare a pattern binding. It is registered like any other member so
    /// it emits in source order.
    pub fn binding(&mut self, parent: Option<DeclId>, pattern: Pattern, init: Option<Expr>) -> DeclId {
        let module = self.own_module();
        let is_static = pattern
            .bound_vars()
            .first()
            .and_then(|v| self.program.get_decl(*v))
            .map(|d| d.is_static)
            .unwrap_or(false);
        let id = self.declare(
            &module,
            parent,
            "",
            DeclKind::PatternBinding(PatternBindingDecl { entries: vec![PatternEntry { pattern, init }] }),
        );
        if let Some(d) = self.get_mut(id) {
            d.is_static = is_static;
        }
        id
    }

    /// Declare a variable and the binding that introduces it. Returns
    /// `(var, binding)`.
    pub fn property(
        &mut self,
        parent: Option<DeclId>,
        name: &str,
        ty: Type,
        is_let: bool,
        init: Option<Expr>,
    ) -> (DeclId, DeclId) {
        let var = self.var(parent, name, ty, is_let);
        let binding = self.binding(parent, Pattern::named(var), init);
        (var, binding)
    }

    /// A local binding that lives in a function body rather than a member
    /// list. Returns `(var, brace element)`.
    pub fn local(&mut self, function: DeclId, name: &str, ty: Type, is_let: bool, init: Option<Expr>) -> (DeclId, BraceElement) {
        let (var, binding) = self.property(Some(function), name, ty, is_let, init);
        (var, BraceElement::Decl(binding))
    }

    pub fn enum_case(&mut self, parent: DeclId, name: &str, raw_value: Option<Expr>, payload: Vec<ParamSpec<'_>>) -> DeclId {
        let module = self.module_of(parent);
        let id = self.declare(
            &module,
            Some(parent),
            name,
            DeclKind::EnumElement(EnumElementDecl { raw_value, payload: Vec::new() }),
        );
        let payload_ids: Vec<DeclId> = payload
            .into_iter()
            .map(|(label, pname, ty)| self.param_in(&module, id, label, pname, ty))
            .collect();
        if let Some(DeclKind::EnumElement(e)) = self.get_mut(id).map(|d| &mut d.kind) {
            e.payload = payload_ids;
        }
        id
    }

    pub fn top_level_code(&mut self, body: Stmt) -> DeclId {
        let module = self.own_module();
        self.declare(&module, None, "", DeclKind::TopLevelCode { body })
    }

    // ------- Relations & flags -------

    pub fn set_overridden(&mut self, decl: DeclId, overridden: DeclId) {
        if let Some(d) = self.get_mut(decl) {
            d.overridden = Some(overridden);
        }
    }

    pub fn add_requirement(&mut self, decl: DeclId, requirement: DeclId) {
        if let Some(d) = self.get_mut(decl) {
            d.requirements.push(requirement);
        }
    }

    pub fn set_static(&mut self, decl: DeclId) {
        if let Some(d) = self.get_mut(decl) {
            d.is_static = true;
        }
    }

    pub fn set_implicit(&mut self, decl: DeclId) {
        if let Some(d) = self.get_mut(decl) {
            d.is_implicit = true;
        }
    }

    pub fn set_visibility(&mut self, decl: DeclId, visibility: Visibility) {
        if let Some(d) = self.get_mut(decl) {
            d.visibility = visibility;
        }
    }

    pub fn set_location(&mut self, decl: DeclId, location: Location) {
        if let Some(d) = self.get_mut(decl) {
            d.location = Some(location);
        }
    }

    fn module_of(&self, id: DeclId) -> String {
        self.program.get_decl(id).map(|d| d.module.clone()).unwrap_or_else(|| self.own_module())
    }
}

// ------- Expression shorthands -------

pub fn decl_ref(decl: DeclId, ty: Type) -> Expr {
    Expr::new(ExprKind::DeclRef { decl, substitutions: Vec::new() }, ty)
}

pub fn specialized_ref(decl: DeclId, substitutions: Vec<Substitution>, ty: Type) -> Expr {
    Expr::new(ExprKind::DeclRef { decl, substitutions }, ty)
}

pub fn int(value: i64, ty: Type) -> Expr {
    Expr::new(ExprKind::IntegerLiteral(value.to_string()), ty)
}

pub fn string(value: &str, ty: Type) -> Expr {
    Expr::new(ExprKind::StringLiteral(value.to_string()), ty)
}

pub fn boolean(value: bool, ty: Type) -> Expr {
    Expr::new(ExprKind::BooleanLiteral(value), ty)
}

pub fn nil(ty: Type) -> Expr {
    Expr::new(ExprKind::NilLiteral, ty)
}

pub fn self_ref(ty: Type) -> Expr {
    Expr::new(ExprKind::SelfRef, ty)
}

pub fn member(base: Expr, decl: DeclId, ty: Type) -> Expr {
    Expr::new(ExprKind::MemberRef { base: Box::new(base), decl, substitutions: Vec::new() }, ty)
}

pub fn method(base: Expr, decl: DeclId) -> Expr {
    Expr::new(ExprKind::MethodRef { base: Box::new(base), decl, substitutions: Vec::new() }, Type::void())
}

pub fn type_ref(ty: Type) -> Expr {
    Expr::new(ExprKind::TypeRef(ty.clone()), Type::Metatype(Box::new(ty)))
}

pub fn constructor(ty: Type, decl: DeclId) -> Expr {
    Expr::new(ExprKind::ConstructorRef { ty: ty.clone(), decl, substitutions: Vec::new() }, Type::void())
}

pub fn arg(expr: Expr) -> Argument {
    Argument::Value { label: None, expr }
}

pub fn call(callee: Expr, args: Vec<Argument>, ty: Type) -> Expr {
    Expr::new(ExprKind::Call { callee: Box::new(callee), args }, ty)
}

pub fn assign(dest: Expr, source: Expr) -> Expr {
    Expr::new(ExprKind::Assign { dest: Box::new(dest), source: Box::new(source) }, Type::void())
}

pub fn stmt(s: super::stmt::StmtKind) -> BraceElement {
    BraceElement::Stmt(Stmt::new(s))
}

pub fn expr(e: Expr) -> BraceElement {
    BraceElement::Expr(e)
}
