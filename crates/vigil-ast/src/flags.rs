//! Operator and modifier flag words.
//!
//! Each module covers one node kind's `flags` field. Values are plain
//! `u32` constants; declaration modifiers combine with `|`, operator
//! selectors are mutually exclusive.

/// `Class` node modifiers.
pub mod class_flags {
    pub const ABSTRACT: u32 = 1 << 0;
    pub const FINAL: u32 = 1 << 1;
    pub const INTERFACE: u32 = 1 << 2;
    pub const TRAIT: u32 = 1 << 3;
}

/// Member (method, property, class constant) modifiers.
pub mod member_flags {
    pub const PUBLIC: u32 = 1 << 0;
    pub const PROTECTED: u32 = 1 << 1;
    pub const PRIVATE: u32 = 1 << 2;
    pub const STATIC: u32 = 1 << 3;
    pub const ABSTRACT: u32 = 1 << 4;
    pub const FINAL: u32 = 1 << 5;
}

/// `BinaryOp` operator selector.
pub mod binary_flags {
    pub const ADD: u32 = 1;
    pub const SUB: u32 = 2;
    pub const MUL: u32 = 3;
    pub const DIV: u32 = 4;
    pub const MOD: u32 = 5;
    pub const POW: u32 = 6;
    pub const CONCAT: u32 = 7;
    pub const IS_EQUAL: u32 = 8;
    pub const IS_NOT_EQUAL: u32 = 9;
    pub const IS_IDENTICAL: u32 = 10;
    pub const IS_NOT_IDENTICAL: u32 = 11;
    pub const IS_SMALLER: u32 = 12;
    pub const IS_SMALLER_OR_EQUAL: u32 = 13;
    pub const IS_GREATER: u32 = 14;
    pub const IS_GREATER_OR_EQUAL: u32 = 15;
    pub const SPACESHIP: u32 = 16;
    pub const BOOL_AND: u32 = 17;
    pub const BOOL_OR: u32 = 18;
    pub const COALESCE: u32 = 19;
    pub const BIT_AND: u32 = 20;
    pub const BIT_OR: u32 = 21;
    pub const BIT_XOR: u32 = 22;
    pub const SHIFT_LEFT: u32 = 23;
    pub const SHIFT_RIGHT: u32 = 24;

    /// Printable operator token, used in diagnostic arguments.
    pub fn token(flags: u32) -> &'static str {
        match flags {
            ADD => "+",
            SUB => "-",
            MUL => "*",
            DIV => "/",
            MOD => "%",
            POW => "**",
            CONCAT => ".",
            IS_EQUAL => "==",
            IS_NOT_EQUAL => "!=",
            IS_IDENTICAL => "===",
            IS_NOT_IDENTICAL => "!==",
            IS_SMALLER => "<",
            IS_SMALLER_OR_EQUAL => "<=",
            IS_GREATER => ">",
            IS_GREATER_OR_EQUAL => ">=",
            SPACESHIP => "<=>",
            BOOL_AND => "&&",
            BOOL_OR => "||",
            COALESCE => "??",
            BIT_AND => "&",
            BIT_OR => "|",
            BIT_XOR => "^",
            SHIFT_LEFT => "<<",
            SHIFT_RIGHT => ">>",
            _ => "?",
        }
    }
}

/// `UnaryOp` operator selector.
pub mod unary_flags {
    pub const MINUS: u32 = 1;
    pub const PLUS: u32 = 2;
    pub const NOT: u32 = 3;
    pub const BITWISE_NOT: u32 = 4;
    pub const SILENCE: u32 = 5;
}

/// `Cast` target selector.
pub mod cast_flags {
    pub const INT: u32 = 1;
    pub const FLOAT: u32 = 2;
    pub const STRING: u32 = 3;
    pub const BOOL: u32 = 4;
    pub const ARRAY: u32 = 5;
    pub const OBJECT: u32 = 6;
    pub const UNSET: u32 = 7;
}

/// `Use` import kind selector.
pub mod use_flags {
    pub const CLASS: u32 = 1;
    pub const FUNCTION: u32 = 2;
    pub const CONST: u32 = 3;
}
