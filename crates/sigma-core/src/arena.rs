//! Arena allocator for expression storage.
//!
//! All nodes live contiguously in one `Vec`. Every structurally unique node
//! is stored exactly once, so handle equality is structural equality.
//! The arena also owns the symbol table and the function registry.

use std::sync::Arc;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::error::ExprError;
use crate::expr::{functions, ExprNode, RealBits};
use crate::function::{Builtin, UnaryFunction};
use crate::handle::{ArenaId, ExprHandle, FunctionId, SymbolId};
use crate::intern::SymbolTable;

/// The main arena for storing expressions.
#[derive(Debug)]
pub struct ExprArena {
    /// Stamped into every handle this arena hands out.
    id: ArenaId,
    /// Storage for all expression nodes.
    nodes: Vec<ExprNode>,
    /// Interning table: maps node content to its handle.
    intern_map: HashMap<ExprNode, ExprHandle>,
    /// Variable names.
    symbols: SymbolTable,
    /// Registered unary functions, indexed by `FunctionId`.
    functions: Vec<Arc<dyn UnaryFunction>>,
}

impl Default for ExprArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprArena {
    /// Creates an empty arena with the built-in functions registered.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an arena with pre-allocated node capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let functions = Builtin::ALL
            .iter()
            .map(|&builtin| Arc::new(builtin) as Arc<dyn UnaryFunction>)
            .collect();
        Self {
            id: ArenaId::next(),
            nodes: Vec::with_capacity(capacity),
            intern_map: HashMap::with_capacity(capacity),
            symbols: SymbolTable::new(),
            functions,
        }
    }

    /// Interns an expression node, returning its handle.
    ///
    /// If an identical node already exists, returns the existing handle.
    ///
    /// # Panics
    ///
    /// Panics if the arena holds `u32::MAX` nodes.
    pub fn intern(&mut self, node: ExprNode) -> ExprHandle {
        if let Some(&handle) = self.intern_map.get(&node) {
            return handle;
        }

        let index = self.nodes.len();
        assert!(index < u32::MAX as usize, "Arena capacity exceeded");

        #[allow(clippy::cast_possible_truncation)]
        let handle = ExprHandle::new(self.id, index as u32);
        self.nodes.push(node.clone());
        self.intern_map.insert(node, handle);
        handle
    }

    /// Gets the node at the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid. Handles from another arena are only
    /// caught in debug builds.
    #[must_use]
    pub fn get(&self, handle: ExprHandle) -> &ExprNode {
        debug_assert_eq!(handle.arena(), self.id, "{handle:?} belongs to another arena");
        &self.nodes[handle.index() as usize]
    }

    /// Gets the node at the given handle, or an error for a foreign handle.
    ///
    /// # Errors
    ///
    /// [`ExprError::InvalidHandle`] if the handle was not created here.
    pub fn try_get(&self, handle: ExprHandle) -> Result<&ExprNode, ExprError> {
        if self.contains(handle) {
            Ok(&self.nodes[handle.index() as usize])
        } else {
            Err(ExprError::InvalidHandle(handle))
        }
    }

    /// Returns true if the handle was created by this arena.
    #[must_use]
    pub fn contains(&self, handle: ExprHandle) -> bool {
        handle.arena() == self.id && (handle.index() as usize) < self.nodes.len()
    }

    /// The id stamped into this arena's handles.
    #[must_use]
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Symbols ===

    /// Interns a variable name, returning its id.
    pub fn intern_symbol(&mut self, name: &str) -> SymbolId {
        self.symbols.intern(name)
    }

    /// Looks up a variable name without interning it.
    #[must_use]
    pub fn symbol_id(&self, name: &str) -> Option<SymbolId> {
        self.symbols.lookup(name)
    }

    /// Gets the name of a symbol by its id.
    #[must_use]
    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.symbols.name(id)
    }

    /// The deviation symbol `sigma_<name>` of a variable.
    ///
    /// Deviation symbols are kept apart from named variables: a variable
    /// interned as `sigma_x` is a different symbol. Returns `None` if
    /// `variable` was not interned here.
    pub fn deviation_symbol(&mut self, variable: SymbolId) -> Option<SymbolId> {
        self.symbols.deviation(variable)
    }

    /// The deviation symbol of `variable` if it was already created.
    #[must_use]
    pub fn find_deviation_symbol(&self, variable: SymbolId) -> Option<SymbolId> {
        self.symbols.find_deviation(variable)
    }

    // === Functions ===

    /// Registers a unary function and returns its id.
    pub fn register_function(&mut self, function: Arc<dyn UnaryFunction>) -> FunctionId {
        let index = self.functions.len();
        assert!(index < u32::MAX as usize, "Function registry capacity exceeded");

        #[allow(clippy::cast_possible_truncation)]
        let id = FunctionId::new(index as u32);
        self.functions.push(function);
        id
    }

    /// Returns the definition of a registered function.
    #[must_use]
    pub fn function_def(&self, id: FunctionId) -> Option<Arc<dyn UnaryFunction>> {
        self.functions.get(id.index() as usize).cloned()
    }

    // === Convenience constructors ===

    /// Creates an integer expression.
    pub fn integer(&mut self, value: i64) -> ExprHandle {
        self.intern(ExprNode::Integer(value))
    }

    /// Creates an exact rational expression in lowest terms.
    ///
    /// # Panics
    ///
    /// Panics if the denominator is zero.
    pub fn rational(&mut self, numerator: i64, denominator: i64) -> ExprHandle {
        assert!(denominator != 0, "denominator cannot be zero");

        let g = gcd(numerator.unsigned_abs(), denominator.unsigned_abs());
        let sign: i128 = if (numerator < 0) == (denominator < 0) { 1 } else { -1 };
        let num = sign * i128::from(numerator.unsigned_abs() / g);
        let den = denominator.unsigned_abs() / g;

        match i64::try_from(num) {
            Ok(num) if den == 1 => self.integer(num),
            Ok(num) => self.intern(ExprNode::Rational(num, den)),
            #[allow(clippy::cast_precision_loss)]
            Err(_) => self.real(num as f64 / den as f64),
        }
    }

    /// Creates a floating point literal.
    pub fn real(&mut self, value: f64) -> ExprHandle {
        self.intern(ExprNode::Real(RealBits::from_f64(value)))
    }

    /// Creates a symbol expression, interning the name.
    pub fn symbol(&mut self, name: &str) -> ExprHandle {
        let id = self.intern_symbol(name);
        self.intern(ExprNode::Symbol(id))
    }

    /// Creates the expression for an already interned symbol.
    pub fn symbol_expr(&mut self, id: SymbolId) -> ExprHandle {
        self.intern(ExprNode::Symbol(id))
    }

    /// Creates an addition expression.
    ///
    /// A single argument is returned unchanged; no arguments give zero.
    pub fn add(&mut self, args: impl IntoIterator<Item = ExprHandle>) -> ExprHandle {
        let args: SmallVec<[ExprHandle; 4]> = args.into_iter().collect();
        match args.len() {
            0 => self.integer(0),
            1 => args[0],
            _ => self.intern(ExprNode::Add(args)),
        }
    }

    /// Creates a multiplication expression.
    ///
    /// A single argument is returned unchanged; no arguments give one.
    pub fn mul(&mut self, args: impl IntoIterator<Item = ExprHandle>) -> ExprHandle {
        let args: SmallVec<[ExprHandle; 4]> = args.into_iter().collect();
        match args.len() {
            0 => self.integer(1),
            1 => args[0],
            _ => self.intern(ExprNode::Mul(args)),
        }
    }

    /// Creates `a - b` as `a + (-b)`.
    pub fn sub(&mut self, a: ExprHandle, b: ExprHandle) -> ExprHandle {
        let neg = self.neg(b);
        self.add([a, neg])
    }

    /// Creates a division expression.
    pub fn div(&mut self, num: ExprHandle, den: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Div { num, den })
    }

    /// Creates a power expression.
    pub fn pow(&mut self, base: ExprHandle, exp: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Pow { base, exp })
    }

    /// Creates `base^2`.
    pub fn square(&mut self, base: ExprHandle) -> ExprHandle {
        let two = self.integer(2);
        self.pow(base, two)
    }

    /// Creates `base^-1`.
    pub fn reciprocal(&mut self, base: ExprHandle) -> ExprHandle {
        let minus_one = self.integer(-1);
        self.pow(base, minus_one)
    }

    /// Creates a negation expression.
    pub fn neg(&mut self, arg: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Neg(arg))
    }

    /// Applies a registered function to an argument.
    ///
    /// # Panics
    ///
    /// Panics if the function id is not registered in this arena.
    pub fn apply(&mut self, id: FunctionId, arg: ExprHandle) -> ExprHandle {
        assert!(
            (id.index() as usize) < self.functions.len(),
            "function {id} is not registered"
        );
        self.intern(ExprNode::Function { id, arg })
    }

    /// Creates `sqrt(arg)`.
    pub fn sqrt(&mut self, arg: ExprHandle) -> ExprHandle {
        self.apply(functions::SQRT, arg)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}
