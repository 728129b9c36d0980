// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The PICO-8 API surface.
//!
//! Reads of these names never warn as undefined, and the completion
//! provider offers them alongside user symbols.

/// Names provided by the PICO-8 runtime, sorted for binary search.
pub const BUILTINS: &[&str] = &[
    "abs",
    "add",
    "all",
    "assert",
    "atan2",
    "band",
    "bnot",
    "bor",
    "btn",
    "btnp",
    "bxor",
    "camera",
    "cartdata",
    "ceil",
    "chr",
    "circ",
    "circfill",
    "clip",
    "cls",
    "cocreate",
    "color",
    "coresume",
    "cos",
    "costatus",
    "count",
    "cstore",
    "cursor",
    "del",
    "deli",
    "dget",
    "dset",
    "extcmd",
    "fget",
    "fillp",
    "flip",
    "flr",
    "foreach",
    "fset",
    "getmetatable",
    "ipairs",
    "line",
    "lshr",
    "map",
    "max",
    "memcpy",
    "memset",
    "menuitem",
    "mget",
    "mid",
    "min",
    "mset",
    "music",
    "next",
    "ord",
    "oval",
    "ovalfill",
    "pack",
    "pairs",
    "pal",
    "palt",
    "peek",
    "peek2",
    "peek4",
    "pget",
    "poke",
    "poke2",
    "poke4",
    "print",
    "printh",
    "pset",
    "rawequal",
    "rawget",
    "rawlen",
    "rawset",
    "rect",
    "rectfill",
    "reload",
    "rnd",
    "rotl",
    "rotr",
    "select",
    "serial",
    "setmetatable",
    "sfx",
    "sget",
    "sgn",
    "shl",
    "shr",
    "sin",
    "split",
    "spr",
    "sqrt",
    "srand",
    "sset",
    "sspr",
    "stat",
    "stop",
    "sub",
    "t",
    "time",
    "tline",
    "tonum",
    "tostr",
    "trace",
    "type",
    "unpack",
    "yield",
];

/// Returns true if the name is part of the PICO-8 API.
#[must_use]
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.binary_search(&name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_table_is_sorted() {
        let mut sorted = BUILTINS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, BUILTINS, "builtin table must stay sorted");
    }

    #[test]
    fn recognizes_api_names() {
        assert!(is_builtin("print"));
        assert!(is_builtin("btn"));
        assert!(is_builtin("atan2"));
        assert!(!is_builtin("player"));
        assert!(!is_builtin("_update60"));
    }
}
