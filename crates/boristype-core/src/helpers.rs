//! Helper catalog: the fixed set of runtime routines lowered code calls into.
//!
//! Injectable helpers ship their source here and are prepended to a file that uses
//! them, once, in catalog order. Primitives are provided natively by the target
//! runtime and are only ever referenced by name.
//!
//! Helper sources are written directly in the target dialect: `var` only, classic
//! `for` loops, `ArrayCount` instead of `.length`. They never pass through the
//! lowering pipeline.

use crate::ast::expression::Expression;
use crate::span::Span;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperKind {
    Injectable,
    Primitive,
}

/// Declaration order is catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Helper {
    // Destructuring and spread support
    ObjectRest,
    ArrayRest,
    NotSupported,
    ObjectUnion,

    // Array shims
    ArrayAt,
    ArrayCopyWithin,
    ArrayEntries,
    ArrayFill,
    ArrayFlat,
    ArrayIncludes,
    ArrayIndexOf,
    ArrayJoin,
    ArrayKeys,
    ArrayLastIndexOf,
    ArrayPop,
    ArrayReverse,
    ArrayShift,
    ArraySlice,
    ArraySort,
    ArraySplice,
    ArrayToReversed,
    ArrayToSorted,
    ArrayToSpliced,
    ArrayUnshift,
    ArrayValues,
    ArrayWith,

    // Math shims
    MathAbs,
    MathCeil,
    MathFloor,
    MathTrunc,
    MathRandom,

    // Runtime primitives
    ArrayUnion,
    ArrayDirect,
    ArrayCount,
    ArraySelectAll,
    IsArray,
    Max,
    Min,
    Int,
    OptInt,
    Random,
    StrCharCount,
    StrUpperCase,
    StrLowerCase,
    Trim,
    StrBegins,
    StrEnds,
    StrContains,
    StrCharRangePos,
}

impl Helper {
    /// Every helper with shipped source, in catalog order
    pub const INJECTABLE: &'static [Helper] = &[
        Helper::ObjectRest,
        Helper::ArrayRest,
        Helper::NotSupported,
        Helper::ObjectUnion,
        Helper::ArrayAt,
        Helper::ArrayCopyWithin,
        Helper::ArrayEntries,
        Helper::ArrayFill,
        Helper::ArrayFlat,
        Helper::ArrayIncludes,
        Helper::ArrayIndexOf,
        Helper::ArrayJoin,
        Helper::ArrayKeys,
        Helper::ArrayLastIndexOf,
        Helper::ArrayPop,
        Helper::ArrayReverse,
        Helper::ArrayShift,
        Helper::ArraySlice,
        Helper::ArraySort,
        Helper::ArraySplice,
        Helper::ArrayToReversed,
        Helper::ArrayToSorted,
        Helper::ArrayToSpliced,
        Helper::ArrayUnshift,
        Helper::ArrayValues,
        Helper::ArrayWith,
        Helper::MathAbs,
        Helper::MathCeil,
        Helper::MathFloor,
        Helper::MathTrunc,
        Helper::MathRandom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Helper::ObjectRest => "___btp_object_rest",
            Helper::ArrayRest => "___btp_array_rest",
            Helper::NotSupported => "___btp_not_supported",
            Helper::ObjectUnion => "ObjectUnion",
            Helper::ArrayAt => "___btt_Array_at",
            Helper::ArrayCopyWithin => "___btt_Array_copyWithin",
            Helper::ArrayEntries => "___btt_Array_entries",
            Helper::ArrayFill => "___btt_Array_fill",
            Helper::ArrayFlat => "___btt_Array_flat",
            Helper::ArrayIncludes => "___btt_Array_includes",
            Helper::ArrayIndexOf => "___btt_Array_indexOf",
            Helper::ArrayJoin => "___btt_Array_join",
            Helper::ArrayKeys => "___btt_Array_keys",
            Helper::ArrayLastIndexOf => "___btt_Array_lastIndexOf",
            Helper::ArrayPop => "___btt_Array_pop",
            Helper::ArrayReverse => "___btt_Array_reverse",
            Helper::ArrayShift => "___btt_Array_shift",
            Helper::ArraySlice => "___btt_Array_slice",
            Helper::ArraySort => "___btt_Array_sort",
            Helper::ArraySplice => "___btt_Array_splice",
            Helper::ArrayToReversed => "___btt_Array_toReversed",
            Helper::ArrayToSorted => "___btt_Array_toSorted",
            Helper::ArrayToSpliced => "___btt_Array_toSpliced",
            Helper::ArrayUnshift => "___btt_Array_unshift",
            Helper::ArrayValues => "___btt_Array_values",
            Helper::ArrayWith => "___btt_Array_with",
            Helper::MathAbs => "___btt_Math_abs",
            Helper::MathCeil => "___btt_Math_ceil",
            Helper::MathFloor => "___btt_Math_floor",
            Helper::MathTrunc => "___btt_Math_trunc",
            Helper::MathRandom => "___btt_Math_random",
            Helper::ArrayUnion => "ArrayUnion",
            Helper::ArrayDirect => "ArrayDirect",
            Helper::ArrayCount => "ArrayCount",
            Helper::ArraySelectAll => "ArraySelectAll",
            Helper::IsArray => "IsArray",
            Helper::Max => "Max",
            Helper::Min => "Min",
            Helper::Int => "Int",
            Helper::OptInt => "OptInt",
            Helper::Random => "Random",
            Helper::StrCharCount => "StrCharCount",
            Helper::StrUpperCase => "StrUpperCase",
            Helper::StrLowerCase => "StrLowerCase",
            Helper::Trim => "Trim",
            Helper::StrBegins => "StrBegins",
            Helper::StrEnds => "StrEnds",
            Helper::StrContains => "StrContains",
            Helper::StrCharRangePos => "StrCharRangePos",
        }
    }

    pub fn kind(self) -> HelperKind {
        if self < Helper::ArrayUnion {
            HelperKind::Injectable
        } else {
            HelperKind::Primitive
        }
    }

    pub fn is_injectable(self) -> bool {
        self.kind() == HelperKind::Injectable
    }

    /// Fixed argument count, `None` for variadic routines
    pub fn arity(self) -> Option<usize> {
        let arity = match self {
            Helper::ArrayUnion | Helper::Max | Helper::Min => return None,
            Helper::MathRandom => 0,
            Helper::NotSupported
            | Helper::ArrayEntries
            | Helper::ArrayKeys
            | Helper::ArrayPop
            | Helper::ArrayReverse
            | Helper::ArrayShift
            | Helper::ArrayToReversed
            | Helper::ArrayValues
            | Helper::MathAbs
            | Helper::MathCeil
            | Helper::MathFloor
            | Helper::MathTrunc
            | Helper::ArrayDirect
            | Helper::ArrayCount
            | Helper::ArraySelectAll
            | Helper::IsArray
            | Helper::Int
            | Helper::OptInt
            | Helper::StrCharCount
            | Helper::StrUpperCase
            | Helper::StrLowerCase
            | Helper::Trim => 1,
            Helper::ObjectRest
            | Helper::ArrayRest
            | Helper::ObjectUnion
            | Helper::ArrayAt
            | Helper::ArrayFlat
            | Helper::ArrayJoin
            | Helper::ArraySort
            | Helper::ArrayToSorted
            | Helper::ArrayUnshift
            | Helper::Random
            | Helper::StrBegins
            | Helper::StrEnds
            | Helper::StrContains => 2,
            Helper::ArrayIncludes
            | Helper::ArrayIndexOf
            | Helper::ArrayLastIndexOf
            | Helper::ArraySlice
            | Helper::ArrayWith
            | Helper::StrCharRangePos => 3,
            Helper::ArrayCopyWithin
            | Helper::ArrayFill
            | Helper::ArraySplice
            | Helper::ArrayToSpliced => 4,
        };
        Some(arity)
    }

    /// Shim for `array.<method>(...)`, if the catalog has one
    pub fn for_array_method(method: &str) -> Option<Helper> {
        let helper = match method {
            "at" => Helper::ArrayAt,
            "copyWithin" => Helper::ArrayCopyWithin,
            "entries" => Helper::ArrayEntries,
            "fill" => Helper::ArrayFill,
            "flat" => Helper::ArrayFlat,
            "includes" => Helper::ArrayIncludes,
            "indexOf" => Helper::ArrayIndexOf,
            "join" => Helper::ArrayJoin,
            "keys" => Helper::ArrayKeys,
            "lastIndexOf" => Helper::ArrayLastIndexOf,
            "pop" => Helper::ArrayPop,
            "reverse" => Helper::ArrayReverse,
            "shift" => Helper::ArrayShift,
            "slice" => Helper::ArraySlice,
            "sort" => Helper::ArraySort,
            "splice" => Helper::ArraySplice,
            "toReversed" => Helper::ArrayToReversed,
            "toSorted" => Helper::ArrayToSorted,
            "toSpliced" => Helper::ArrayToSpliced,
            "unshift" => Helper::ArrayUnshift,
            "values" => Helper::ArrayValues,
            "with" => Helper::ArrayWith,
            _ => return None,
        };
        Some(helper)
    }

    /// Replacement for `Math.<method>(...)`, if the catalog has one
    pub fn for_math_method(method: &str) -> Option<Helper> {
        let helper = match method {
            "abs" => Helper::MathAbs,
            "ceil" => Helper::MathCeil,
            "floor" => Helper::MathFloor,
            "trunc" => Helper::MathTrunc,
            "random" => Helper::MathRandom,
            "max" => Helper::Max,
            "min" => Helper::Min,
            _ => return None,
        };
        Some(helper)
    }

    /// `name(arguments)`
    pub fn call(self, arguments: Vec<Expression>, span: Span) -> Expression {
        Expression::call_named(self.name(), arguments, span)
    }

    /// Target-dialect source of an injectable helper
    pub fn source(self) -> Option<&'static str> {
        let source = match self {
            Helper::ObjectRest => OBJECT_REST,
            Helper::ArrayRest => ARRAY_REST,
            Helper::NotSupported => NOT_SUPPORTED,
            Helper::ObjectUnion => OBJECT_UNION,
            Helper::ArrayAt => ARRAY_AT,
            Helper::ArrayCopyWithin => ARRAY_COPY_WITHIN,
            Helper::ArrayEntries => ARRAY_ENTRIES,
            Helper::ArrayFill => ARRAY_FILL,
            Helper::ArrayFlat => ARRAY_FLAT,
            Helper::ArrayIncludes => ARRAY_INCLUDES,
            Helper::ArrayIndexOf => ARRAY_INDEX_OF,
            Helper::ArrayJoin => ARRAY_JOIN,
            Helper::ArrayKeys => ARRAY_KEYS,
            Helper::ArrayLastIndexOf => ARRAY_LAST_INDEX_OF,
            Helper::ArrayPop => ARRAY_POP,
            Helper::ArrayReverse => ARRAY_REVERSE,
            Helper::ArrayShift => ARRAY_SHIFT,
            Helper::ArraySlice => ARRAY_SLICE,
            Helper::ArraySort => ARRAY_SORT,
            Helper::ArraySplice => ARRAY_SPLICE,
            Helper::ArrayToReversed => ARRAY_TO_REVERSED,
            Helper::ArrayToSorted => ARRAY_TO_SORTED,
            Helper::ArrayToSpliced => ARRAY_TO_SPLICED,
            Helper::ArrayUnshift => ARRAY_UNSHIFT,
            Helper::ArrayValues => ARRAY_VALUES,
            Helper::ArrayWith => ARRAY_WITH,
            Helper::MathAbs => MATH_ABS,
            Helper::MathCeil => MATH_CEIL,
            Helper::MathFloor => MATH_FLOOR,
            Helper::MathTrunc => MATH_TRUNC,
            Helper::MathRandom => MATH_RANDOM,
            _ => return None,
        };
        Some(source)
    }
}

/// Helpers a file needs, iterated in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelperUsage {
    used: BTreeSet<Helper>,
}

impl HelperUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, helper: Helper) {
        self.used.insert(helper);
    }

    pub fn contains(&self, helper: Helper) -> bool {
        self.used.contains(&helper)
    }

    pub fn merge(&mut self, other: &HelperUsage) {
        self.used.extend(other.used.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Helper> + '_ {
        self.used.iter().copied()
    }

    /// Used helpers whose source must be prepended, in catalog order
    pub fn injectables(&self) -> impl Iterator<Item = Helper> + '_ {
        self.iter().filter(|helper| helper.is_injectable())
    }
}

const OBJECT_REST: &str = r#"function ___btp_object_rest(obj, exclude) {
    var newObj = {};
    var key = undefined;
    var i = undefined;
    var skip = undefined;
    for (key in obj) {
        skip = false;
        for (i = 0; i < ArrayCount(exclude); i++) {
            if (exclude[i] === key) {
                skip = true;
                break;
            }
        }
        if (!skip) {
            newObj.SetProperty(key, obj.GetProperty(key));
        }
    }
    return newObj;
}
"#;

const ARRAY_REST: &str = r#"function ___btp_array_rest(arr, start) {
    var newArr = [];
    var i = undefined;
    for (i = start; i < ArrayCount(arr); i++) {
        newArr.push(arr[i]);
    }
    return newArr;
}
"#;

const NOT_SUPPORTED: &str = r#"function ___btp_not_supported(message) {
    throw "Not supported: " + message;
}
"#;

const OBJECT_UNION: &str = r#"function ObjectUnion(obj1, obj2) {
    var newObject = {};
    var key = undefined;
    for (key in obj1) {
        newObject.SetProperty(key, obj1.GetProperty(key));
    }
    for (key in obj2) {
        newObject.SetProperty(key, obj2.GetProperty(key));
    }
    return newObject;
}
"#;

const ARRAY_AT: &str = r#"function ___btt_Array_at(array, index) {
    if (array === undefined || array === null || !IsArray(array)) {
        return undefined;
    }
    var len = ArrayCount(array);
    var normalizedIndex = Int(index);
    if (normalizedIndex < 0) {
        var positiveIndex = len + normalizedIndex;
        return positiveIndex >= 0 ? array[positiveIndex] : undefined;
    }
    return normalizedIndex < len ? array[normalizedIndex] : undefined;
}
"#;

const ARRAY_COPY_WITHIN: &str = r#"function ___btt_Array_copyWithin(array, target, start, end) {
    if (array === undefined || array === null || !IsArray(array)) {
        return undefined;
    }
    var len = ArrayCount(array);
    var to = Int(target);
    var from = start === undefined ? 0 : Int(start);
    var last = OptInt(end) ? Int(end) : len;
    var normalizedTarget = to < 0 ? Max(len + to, 0) : Min(to, len);
    var normalizedStart = from < 0 ? Max(len + from, 0) : Min(from, len);
    var normalizedEnd = last < 0 ? Max(len + last, 0) : Min(last, len);
    var count = Min(normalizedEnd - normalizedStart, len - normalizedTarget);
    var i = undefined;
    if (count > 0) {
        if (normalizedStart < normalizedTarget && normalizedTarget < normalizedStart + count) {
            for (i = count - 1; i >= 0; i--) {
                array[normalizedTarget + i] = array[normalizedStart + i];
            }
        } else {
            for (i = 0; i < count; i++) {
                array[normalizedTarget + i] = array[normalizedStart + i];
            }
        }
    }
    return array;
}
"#;

const ARRAY_ENTRIES: &str = r#"function ___btt_Array_entries(array) {
    var result = [];
    var i = undefined;
    for (i = 0; i < ArrayCount(array); i++) {
        result.push([i, array[i]]);
    }
    return result;
}
"#;

const ARRAY_FILL: &str = r#"function ___btt_Array_fill(array, value, start, end) {
    if (array === undefined || array === null || !IsArray(array)) {
        return array;
    }
    var len = ArrayCount(array);
    var normalizedStart = start === undefined ? 0 : Int(start);
    var normalizedEnd = end === undefined ? len : Int(end);
    var from = normalizedStart < 0 ? Max(len + normalizedStart, 0) : Min(normalizedStart, len);
    var to = normalizedEnd < 0 ? Max(len + normalizedEnd, 0) : Min(normalizedEnd, len);
    var i = undefined;
    for (i = from; i < to; i++) {
        array[i] = value;
    }
    return array;
}
"#;

const ARRAY_FLAT: &str = r#"function ___btt_Array_flat(array, depth) {
    var level = depth === undefined ? 1 : Int(depth);
    var result = [];
    var i = undefined;
    var j = undefined;
    var value = undefined;
    var flattened = undefined;
    for (i = 0; i < ArrayCount(array); i++) {
        value = array[i];
        if (IsArray(value) && level > 0) {
            flattened = ___btt_Array_flat(value, level - 1);
            for (j = 0; j < ArrayCount(flattened); j++) {
                result.push(flattened[j]);
            }
        } else {
            result.push(value);
        }
    }
    return result;
}
"#;

const ARRAY_INCLUDES: &str = r#"function ___btt_Array_includes(array, searchElement, fromIndex) {
    var from = fromIndex === undefined ? 0 : Int(fromIndex);
    var len = ArrayCount(array);
    var i = undefined;
    for (i = from >= 0 ? from : Max(len + from, 0); i < len; i++) {
        if (array[i] === searchElement) {
            return true;
        }
    }
    return false;
}
"#;

const ARRAY_INDEX_OF: &str = r#"function ___btt_Array_indexOf(array, searchElement, fromIndex) {
    var from = fromIndex === undefined ? 0 : Int(fromIndex);
    var len = ArrayCount(array);
    var i = undefined;
    for (i = from >= 0 ? from : Max(len + from, 0); i < len; i++) {
        if (array[i] === searchElement) {
            return i;
        }
    }
    return -1;
}
"#;

const ARRAY_JOIN: &str = r#"function ___btt_Array_join(array, separator) {
    var glue = separator === undefined ? "," : separator;
    var result = "";
    var len = ArrayCount(array);
    var i = undefined;
    for (i = 0; i < len; i++) {
        result += array[i];
        if (i < len - 1) {
            result += glue;
        }
    }
    return result;
}
"#;

const ARRAY_KEYS: &str = r#"function ___btt_Array_keys(array) {
    var result = [];
    var i = undefined;
    for (i = 0; i < ArrayCount(array); i++) {
        result.push(i);
    }
    return result;
}
"#;

const ARRAY_LAST_INDEX_OF: &str = r#"function ___btt_Array_lastIndexOf(array, searchElement, fromIndex) {
    var len = ArrayCount(array);
    var from = fromIndex === undefined ? len - 1 : Int(fromIndex);
    var i = undefined;
    for (i = from >= 0 ? Min(from, len - 1) : len + from; i >= 0; i--) {
        if (array[i] === searchElement) {
            return i;
        }
    }
    return -1;
}
"#;

const ARRAY_POP: &str = r#"function ___btt_Array_pop(array) {
    var len = ArrayCount(array);
    if (len === 0) {
        return undefined;
    }
    var value = array[len - 1];
    array.splice(len - 1, 1);
    return value;
}
"#;

const ARRAY_REVERSE: &str = r#"function ___btt_Array_reverse(array) {
    var len = ArrayCount(array);
    var mid = Int(len / 2);
    var i = undefined;
    var opposite = undefined;
    var temp = undefined;
    for (i = 0; i < mid; i++) {
        opposite = len - i - 1;
        temp = array[i];
        array[i] = array[opposite];
        array[opposite] = temp;
    }
    return array;
}
"#;

const ARRAY_SHIFT: &str = r#"function ___btt_Array_shift(array) {
    if (ArrayCount(array) === 0) {
        return undefined;
    }
    var value = array[0];
    array.splice(0, 1);
    return value;
}
"#;

const ARRAY_SLICE: &str = r#"function ___btt_Array_slice(array, start, end) {
    var len = ArrayCount(array);
    var normalizedStart = start === undefined ? 0 : Int(start);
    var normalizedEnd = end === undefined ? len : Int(end);
    var from = normalizedStart < 0 ? Max(len + normalizedStart, 0) : Min(normalizedStart, len);
    var to = normalizedEnd < 0 ? Max(len + normalizedEnd, 0) : Min(normalizedEnd, len);
    var result = [];
    var i = undefined;
    for (i = from; i < to; i++) {
        result.push(array[i]);
    }
    return result;
}
"#;

const ARRAY_SORT: &str = r#"function ___btt_Array_sort(array, compareFn) {
    throw "Array.sort is not implemented";
}
"#;

const ARRAY_SPLICE: &str = r#"function ___btt_Array_splice(array, start, deleteCount, items) {
    var len = ArrayCount(array);
    var from = Int(start);
    from = from < 0 ? Max(len + from, 0) : Min(from, len);
    var count = deleteCount === undefined ? len - from : Min(Max(Int(deleteCount), 0), len - from);
    var removed = [];
    var tail = [];
    var i = undefined;
    for (i = from; i < from + count; i++) {
        removed.push(array[i]);
    }
    for (i = from + count; i < len; i++) {
        tail.push(array[i]);
    }
    array.splice(from, len - from);
    for (i = 0; i < ArrayCount(items); i++) {
        array.push(items[i]);
    }
    for (i = 0; i < ArrayCount(tail); i++) {
        array.push(tail[i]);
    }
    return removed;
}
"#;

const ARRAY_TO_REVERSED: &str = r#"function ___btt_Array_toReversed(array) {
    var len = ArrayCount(array);
    var result = [];
    var i = undefined;
    for (i = len - 1; i >= 0; i--) {
        result.push(array[i]);
    }
    return result;
}
"#;

const ARRAY_TO_SORTED: &str = r#"function ___btt_Array_toSorted(array, compareFn) {
    throw "Array.toSorted is not implemented";
}
"#;

const ARRAY_TO_SPLICED: &str = r#"function ___btt_Array_toSpliced(array, start, deleteCount, items) {
    var len = ArrayCount(array);
    var from = Int(start);
    from = from < 0 ? Max(len + from, 0) : Min(from, len);
    var count = deleteCount === undefined ? len - from : Min(Max(Int(deleteCount), 0), len - from);
    var result = [];
    var i = undefined;
    for (i = 0; i < from; i++) {
        result.push(array[i]);
    }
    for (i = 0; i < ArrayCount(items); i++) {
        result.push(items[i]);
    }
    for (i = from + count; i < len; i++) {
        result.push(array[i]);
    }
    return result;
}
"#;

const ARRAY_UNSHIFT: &str = r#"function ___btt_Array_unshift(array, items) {
    var previous = ArraySelectAll(array);
    var i = undefined;
    array.splice(0, ArrayCount(array));
    for (i = 0; i < ArrayCount(items); i++) {
        array.push(items[i]);
    }
    for (i = 0; i < ArrayCount(previous); i++) {
        array.push(previous[i]);
    }
    return ArrayCount(array);
}
"#;

const ARRAY_VALUES: &str = r#"function ___btt_Array_values(array) {
    return ArraySelectAll(array);
}
"#;

const ARRAY_WITH: &str = r#"function ___btt_Array_with(array, index, value) {
    var len = ArrayCount(array);
    var position = Int(index);
    if (position < 0) {
        position = len + position;
    }
    if (position < 0 || position >= len) {
        throw "Invalid index: " + index;
    }
    var result = ArraySelectAll(array);
    result[position] = value;
    return result;
}
"#;

const MATH_ABS: &str = r#"function ___btt_Math_abs(num) {
    if (num < 0) {
        return -num;
    }
    return num;
}
"#;

const MATH_CEIL: &str = r#"function ___btt_Math_ceil(num) {
    var temp = undefined;
    if (num < 0) {
        temp = Math.round(-num);
        return -(temp > -num ? temp - 1 : temp);
    }
    temp = Math.round(num);
    return temp < num ? temp + 1 : temp;
}
"#;

const MATH_FLOOR: &str = r#"function ___btt_Math_floor(num) {
    var temp = undefined;
    if (num < 0) {
        temp = Math.round(-num);
        return -(temp < -num ? temp + 1 : temp);
    }
    temp = Math.round(num);
    return temp > num ? temp - 1 : temp;
}
"#;

const MATH_TRUNC: &str = r#"function ___btt_Math_trunc(num) {
    var temp = undefined;
    if (num < 0) {
        temp = Math.round(-num);
        return -(temp > -num ? temp - 1 : temp);
    }
    temp = Math.round(num);
    return temp > num ? temp - 1 : temp;
}
"#;

const MATH_RANDOM: &str = r#"function ___btt_Math_random() {
    var value = Random(0, 65535);
    return value / 65535.0;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::Statement;
    use crate::parser::parse_source;

    #[test]
    fn test_every_injectable_source_is_one_function_with_catalog_arity() {
        for &helper in Helper::INJECTABLE {
            let source = helper.source().expect("injectable helper without source");
            let program = parse_source(source)
                .unwrap_or_else(|e| panic!("{} does not parse: {}", helper.name(), e));
            assert_eq!(program.statements.len(), 1, "{}", helper.name());
            match &program.statements[0] {
                Statement::Function(function) => {
                    assert_eq!(function.name.node, helper.name());
                    assert_eq!(Some(function.parameters.len()), helper.arity(), "{}", helper.name());
                }
                other => panic!("{} is not a function declaration: {:?}", helper.name(), other),
            }
        }
    }

    #[test]
    fn test_primitives_have_no_source() {
        for helper in [Helper::ArrayUnion, Helper::ArrayCount, Helper::StrCharRangePos, Helper::Int] {
            assert_eq!(helper.kind(), HelperKind::Primitive);
            assert!(helper.source().is_none());
        }
    }

    #[test]
    fn test_injectable_list_matches_kinds() {
        assert!(Helper::INJECTABLE.iter().all(|helper| helper.is_injectable()));
        assert!(Helper::INJECTABLE.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_usage_iterates_in_catalog_order() {
        let mut usage = HelperUsage::new();
        usage.mark(Helper::MathAbs);
        usage.mark(Helper::ArrayCount);
        usage.mark(Helper::ObjectRest);
        usage.mark(Helper::ObjectRest);

        let injected: Vec<_> = usage.injectables().collect();
        assert_eq!(injected, vec![Helper::ObjectRest, Helper::MathAbs]);
        assert!(usage.contains(Helper::ArrayCount));
    }

    #[test]
    fn test_method_lookup() {
        assert_eq!(Helper::for_array_method("at"), Some(Helper::ArrayAt));
        assert_eq!(Helper::for_array_method("push"), None);
        assert_eq!(Helper::for_math_method("max"), Some(Helper::Max));
        assert_eq!(Helper::for_math_method("round"), None);
    }
}
