//! Tests for the type lattice and signatures.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::error::DispatchError;

fn t(class: &Class) -> Type {
    Type::from(class)
}

fn sig(types: Vec<Type>) -> Signature {
    Signature::new(types).unwrap()
}

fn varargs(class: &Class) -> Type {
    Type::var_args(t(class)).unwrap()
}

// === Classes ===

#[test]
fn test_subclass_is_reflexive_and_transitive() {
    let animal = Class::new("Animal", &[]);
    let cat = Class::new("Cat", &[animal.clone()]);
    let kitten = Class::new("Kitten", &[cat.clone()]);

    assert!(kitten.is_subclass_of(&kitten));
    assert!(kitten.is_subclass_of(&cat));
    assert!(kitten.is_subclass_of(&animal));
    assert!(kitten.is_subclass_of(&Class::object()));
    assert!(!animal.is_subclass_of(&cat));
}

#[test]
fn test_mro_puts_object_last() {
    let a = Class::new("A", &[]);
    let b = Class::new("B", &[]);
    let c = Class::new("C", &[a.clone(), b.clone()]);

    assert_eq!(
        c.mro(),
        &[c.id(), a.id(), b.id(), Class::object().id()]
    );
}

#[test]
fn test_classes_compare_by_identity() {
    let first = Class::new("Point", &[]);
    let second = Class::new("Point", &[]);
    assert!(first != second);
    assert_eq!(first.clone(), first);
}

#[test]
fn test_builtin_bool_is_int() {
    let b = Builtins::new();
    assert!(b.bool.is_subclass_of(&b.int));
    assert!(!b.int.is_subclass_of(&b.float));
}

// === Types ===

#[test]
fn test_concrete_order() {
    let b = Builtins::new();
    assert!(t(&b.bool).le(&t(&b.int)));
    assert!(!t(&b.int).le(&t(&b.bool)));
    assert!(t(&b.int).le(&Type::object()));
    assert!(t(&b.bool).lt(&t(&b.int)));
}

#[test]
fn test_union_is_existential_on_the_right() {
    let b = Builtins::new();
    let int_or_str = Type::union([t(&b.int), t(&b.str)]).unwrap();

    assert!(t(&b.int).le(&int_or_str));
    assert!(t(&b.str).le(&int_or_str));
    assert!(t(&b.bool).le(&int_or_str));
    assert!(!t(&b.float).le(&int_or_str));
}

#[test]
fn test_union_is_universal_on_the_left() {
    let b = Builtins::new();
    let int_or_str = Type::union([t(&b.int), t(&b.str)]).unwrap();
    let int_str_float = Type::union([t(&b.int), t(&b.str), t(&b.float)]).unwrap();

    assert!(!int_or_str.le(&t(&b.int)));
    assert!(int_or_str.le(&Type::object()));
    assert!(int_or_str.le(&int_str_float));
    assert!(!int_str_float.le(&int_or_str));
}

#[test]
fn test_union_equality_ignores_order() {
    let b = Builtins::new();
    let ab = Type::union([t(&b.int), t(&b.str)]).unwrap();
    let ba = Type::union([t(&b.str), t(&b.int)]).unwrap();
    assert_eq!(ab, ba);
}

#[test]
fn test_union_flattens_and_drops_subsumed_members() {
    let b = Builtins::new();
    let inner = Type::union([t(&b.str), t(&b.float)]).unwrap();
    let nested = Type::union([t(&b.bool), inner, t(&b.int)]).unwrap();
    let flat = Type::union([t(&b.int), t(&b.str), t(&b.float)]).unwrap();
    assert_eq!(nested, flat);
}

#[test]
fn test_single_member_union_collapses() {
    let b = Builtins::new();
    assert_eq!(Type::union([t(&b.int), t(&b.bool)]).unwrap(), t(&b.int));
}

#[test]
fn test_union_rejects_varargs() {
    let b = Builtins::new();
    let err = Type::union([t(&b.int), varargs(&b.str)]).unwrap_err();
    assert!(matches!(err, DispatchError::MalformedType { .. }));
}

#[test]
fn test_varargs_cannot_nest() {
    let b = Builtins::new();
    let err = Type::var_args(varargs(&b.int)).unwrap_err();
    assert!(matches!(err, DispatchError::MalformedType { .. }));
}

#[test]
fn test_varargs_only_compare_with_varargs() {
    let b = Builtins::new();
    assert!(varargs(&b.bool).le(&varargs(&b.int)));
    assert!(!varargs(&b.int).le(&varargs(&b.bool)));
    assert!(!varargs(&b.int).le(&t(&b.int)));
    assert!(!t(&b.int).le(&varargs(&b.int)));
}

#[test]
fn test_self_only_matches_self() {
    let b = Builtins::new();
    assert!(Type::SelfType.le(&Type::SelfType));
    assert!(!Type::SelfType.le(&t(&b.int)));
    assert!(!t(&b.int).le(&Type::SelfType));
}

#[test]
fn test_display() {
    let b = Builtins::new();
    let ty = Type::var_args(Type::union([t(&b.str), t(&b.int)]).unwrap()).unwrap();
    let rendered = ty.to_string();
    assert!(rendered.starts_with("VarArgs[Union["));
    assert!(rendered.contains("int") && rendered.contains("str"));
}

// === Signatures ===

#[test]
fn test_varargs_must_be_last() {
    let b = Builtins::new();
    let err = Signature::new([varargs(&b.int), t(&b.str)]).unwrap_err();
    assert!(matches!(err, DispatchError::MalformedSignature { .. }));
    assert!(Signature::new([t(&b.str), varargs(&b.int)]).is_ok());
}

#[test]
fn test_signature_normalizes_hand_built_unions() {
    let b = Builtins::new();
    let int_str = Type::Union(Arc::from([t(&b.int), t(&b.str)]));
    let str_int = Type::Union(Arc::from([t(&b.str), t(&b.int)]));
    assert!(int_str != str_int);

    let first = sig(vec![int_str]);
    let second = sig(vec![str_int]);
    assert_eq!(first, second);
    assert_eq!(first.types()[0], Type::union([t(&b.int), t(&b.str)]).unwrap());

    let subsumed = sig(vec![Type::Union(Arc::from([t(&b.bool), t(&b.int)]))]);
    assert_eq!(subsumed.types(), &[t(&b.int)]);
}

#[test]
fn test_signature_rejects_hand_built_nested_varargs() {
    let b = Builtins::new();
    let nested = Type::VarArgs(Arc::new(Type::VarArgs(Arc::new(t(&b.int)))));
    let err = Signature::new([t(&b.str), nested]).unwrap_err();
    assert!(matches!(err, DispatchError::MalformedType { .. }));
}

#[test]
fn test_signature_rejects_varargs_inside_hand_built_union() {
    let b = Builtins::new();
    let union = Type::Union(Arc::from([t(&b.str), varargs(&b.int)]));
    let err = Signature::new([union]).unwrap_err();
    assert!(matches!(err, DispatchError::MalformedType { .. }));

    let tail = Type::VarArgs(Arc::new(Type::Union(Arc::from([t(&b.str), varargs(&b.int)]))));
    assert!(Signature::new([tail]).is_err());
}

#[test]
fn test_normalize_keeps_checked_types() {
    let b = Builtins::new();
    let ty = Type::var_args(Type::union([t(&b.str), t(&b.int)]).unwrap()).unwrap();
    assert_eq!(ty.normalize().unwrap(), ty);
    assert_eq!(Type::SelfType.normalize().unwrap(), Type::SelfType);
}

#[test]
fn test_base_and_length() {
    let b = Builtins::new();
    let s = sig(vec![t(&b.str), varargs(&b.int)]);
    assert_eq!(s.base(), &[t(&b.str)]);
    assert_eq!(s.len(), 1);
    assert!(s.has_varargs());
    assert_eq!(s.varargs_type(), Some(&t(&b.int)));

    let empty = sig(vec![]);
    assert!(empty.is_empty());
    assert!(!empty.has_varargs());
}

#[test]
fn test_compatibility() {
    let b = Builtins::new();
    let fixed1 = sig(vec![t(&b.int)]);
    let fixed2 = sig(vec![t(&b.int), t(&b.int)]);
    let var0 = sig(vec![varargs(&b.int)]);

    assert!(fixed1.is_compatible(&fixed1));
    assert!(!fixed1.is_compatible(&fixed2));
    assert!(fixed2.is_compatible(&var0));
    assert!(var0.is_compatible(&fixed2));
}

#[test]
fn test_expand_varargs() {
    let b = Builtins::new();
    let s = sig(vec![t(&b.str), varargs(&b.int)]);
    let call = sig(vec![t(&b.str), t(&b.int), t(&b.int)]);

    let expanded: Vec<_> = s.expand_varargs_to(&call).cloned().collect();
    assert_eq!(expanded, vec![t(&b.str), t(&b.int), t(&b.int)]);

    let fixed: Vec<_> = call.expand_varargs_to(&s).cloned().collect();
    assert_eq!(fixed, call.types().to_vec());
}

#[test]
fn test_call_accepted_by_varargs_signature() {
    let b = Builtins::new();
    let s = sig(vec![t(&b.str), varargs(&b.int)]);

    assert!(sig(vec![t(&b.str)]).le(&s));
    assert!(sig(vec![t(&b.str), t(&b.int)]).le(&s));
    assert!(sig(vec![t(&b.str), t(&b.bool), t(&b.int)]).le(&s));
    assert!(!sig(vec![t(&b.str), t(&b.str)]).le(&s));
    assert!(!sig(vec![]).le(&s));
}

#[test]
fn test_varargs_signature_never_below_fixed() {
    let b = Builtins::new();
    let fixed = sig(vec![t(&b.int), t(&b.int)]);
    let variadic = sig(vec![t(&b.int), varargs(&b.int)]);

    assert!(fixed.le(&variadic));
    assert!(!variadic.le(&fixed));
    assert!(fixed.lt(&variadic));
}

#[test]
fn test_more_general_varargs_not_below() {
    let b = Builtins::new();
    let narrow = sig(vec![varargs(&b.bool)]);
    let wide = sig(vec![varargs(&b.int)]);

    assert!(narrow.le(&wide));
    assert!(!wide.le(&narrow));
}

#[test]
fn test_signature_equality_and_hash() {
    use std::collections::HashSet;

    let b = Builtins::new();
    let a = sig(vec![Type::union([t(&b.int), t(&b.str)]).unwrap()]);
    let c = sig(vec![Type::union([t(&b.str), t(&b.int)]).unwrap()]);

    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&c));
    assert!(a.le(&c) && c.le(&a));
}

#[test]
fn test_signature_display() {
    let b = Builtins::new();
    let s = sig(vec![t(&b.str), varargs(&b.int)]);
    assert_eq!(s.to_string(), "(str, VarArgs[int])");
}
