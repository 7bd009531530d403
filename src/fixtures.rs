//! Hand-built classes and class-file bytes shared by the unit tests.

use std::sync::Arc;

use crate::context::{ExemptionPolicy, VerificationContext};
use crate::model::{
    BinaryClass, ClassFlags, Field, FieldFlags, Instruction, InvokeKind, Method, MethodFlags,
};
use crate::pool::{ClassPool, ParsedPool};
use crate::resolver::{PoolResolver, Resolver};

pub(crate) fn class(name: &str, super_name: Option<&str>, flags: ClassFlags) -> BinaryClass {
    BinaryClass {
        name: name.to_string(),
        super_name: super_name.map(str::to_string),
        interfaces: Vec::new(),
        flags,
        fields: Vec::new(),
        methods: Vec::new(),
    }
}

pub(crate) fn concrete_class(name: &str, super_name: Option<&str>) -> BinaryClass {
    class(name, super_name, ClassFlags::PUBLIC | ClassFlags::SUPER)
}

pub(crate) fn public_class(name: &str) -> BinaryClass {
    concrete_class(name, Some("java/lang/Object"))
}

pub(crate) fn abstract_class(name: &str, super_name: Option<&str>) -> BinaryClass {
    class(
        name,
        super_name,
        ClassFlags::PUBLIC | ClassFlags::SUPER | ClassFlags::ABSTRACT,
    )
}

pub(crate) fn final_class(name: &str, super_name: Option<&str>) -> BinaryClass {
    class(
        name,
        super_name,
        ClassFlags::PUBLIC | ClassFlags::SUPER | ClassFlags::FINAL,
    )
}

pub(crate) fn interface(name: &str) -> BinaryClass {
    class(
        name,
        Some("java/lang/Object"),
        ClassFlags::PUBLIC | ClassFlags::INTERFACE | ClassFlags::ABSTRACT,
    )
}

pub(crate) fn interface_extending(name: &str, supers: &[&str]) -> BinaryClass {
    let mut iface = interface(name);
    iface.interfaces = supers.iter().map(|s| s.to_string()).collect();
    iface
}

pub(crate) fn method(name: &str, descriptor: &str, flags: MethodFlags) -> Method {
    Method {
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        flags,
        instructions: Vec::new(),
        declared_exceptions: Vec::new(),
        catch_types: Vec::new(),
        local_variable_types: Vec::new(),
    }
}

pub(crate) fn abstract_method(name: &str, descriptor: &str) -> Method {
    method(name, descriptor, MethodFlags::PUBLIC | MethodFlags::ABSTRACT)
}

/// Public concrete method; on an interface this is a default method.
pub(crate) fn default_method(name: &str, descriptor: &str) -> Method {
    method(name, descriptor, MethodFlags::PUBLIC)
}

pub(crate) fn private_method(name: &str, descriptor: &str) -> Method {
    method(name, descriptor, MethodFlags::PRIVATE)
}

pub(crate) fn protected_method(name: &str, descriptor: &str) -> Method {
    method(name, descriptor, MethodFlags::PROTECTED)
}

pub(crate) fn static_method(name: &str, descriptor: &str) -> Method {
    method(name, descriptor, MethodFlags::PUBLIC | MethodFlags::STATIC)
}

pub(crate) fn final_method(name: &str, descriptor: &str) -> Method {
    method(name, descriptor, MethodFlags::PUBLIC | MethodFlags::FINAL)
}

pub(crate) fn accessor_stub(name: &str, descriptor: &str) -> Method {
    method(
        name,
        descriptor,
        MethodFlags::STATIC | MethodFlags::SYNTHETIC,
    )
}

pub(crate) fn field(name: &str, descriptor: &str) -> Field {
    Field {
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        flags: FieldFlags::PUBLIC,
    }
}

pub(crate) fn static_field(name: &str, descriptor: &str) -> Field {
    let mut f = field(name, descriptor);
    f.flags |= FieldFlags::STATIC;
    f
}

pub(crate) fn final_field(name: &str, descriptor: &str) -> Field {
    let mut f = field(name, descriptor);
    f.flags |= FieldFlags::FINAL;
    f
}

pub(crate) fn invoke(owner: &str, name: &str, descriptor: &str, kind: InvokeKind) -> Instruction {
    Instruction::InvokeMethod {
        owner: owner.to_string(),
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        kind,
    }
}

pub(crate) fn parsed_pool(origin: &str, classes: Vec<BinaryClass>) -> Arc<dyn ClassPool> {
    Arc::new(ParsedPool::from_classes(origin, classes))
}

pub(crate) fn pool_resolver(origin: &str, classes: Vec<BinaryClass>) -> Arc<dyn Resolver> {
    Arc::new(PoolResolver::new(parsed_pool(origin, classes)))
}

pub(crate) fn context_over(classes: Vec<BinaryClass>) -> VerificationContext {
    VerificationContext::new(
        pool_resolver("test", classes),
        ExemptionPolicy::new(),
    )
}

/// Serialized class file for a public class `name` extending
/// `java/lang/Object` with one public method `run()V` whose body calls
/// `com/example/Api.call()V` via invokevirtual and returns.
pub(crate) fn sample_class_bytes(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // minor
    out.extend_from_slice(&52u16.to_be_bytes()); // major, Java 8

    // Constant pool, 12 entries.
    out.extend_from_slice(&13u16.to_be_bytes());
    push_utf8(&mut out, name); // 1
    push_class(&mut out, 1); // 2
    push_utf8(&mut out, "java/lang/Object"); // 3
    push_class(&mut out, 3); // 4
    push_utf8(&mut out, "run"); // 5
    push_utf8(&mut out, "()V"); // 6
    push_utf8(&mut out, "Code"); // 7
    push_utf8(&mut out, "com/example/Api"); // 8
    push_class(&mut out, 8); // 9
    push_utf8(&mut out, "call"); // 10
    // 11: NameAndType call:()V
    out.push(12);
    out.extend_from_slice(&10u16.to_be_bytes());
    out.extend_from_slice(&6u16.to_be_bytes());
    // 12: Methodref com/example/Api.call:()V
    out.push(10);
    out.extend_from_slice(&9u16.to_be_bytes());
    out.extend_from_slice(&11u16.to_be_bytes());

    out.extend_from_slice(&0x0021u16.to_be_bytes()); // ACC_PUBLIC | ACC_SUPER
    out.extend_from_slice(&2u16.to_be_bytes()); // this_class
    out.extend_from_slice(&4u16.to_be_bytes()); // super_class
    out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
    out.extend_from_slice(&0u16.to_be_bytes()); // fields

    // One method: public run()V with a Code attribute.
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0x0001u16.to_be_bytes());
    out.extend_from_slice(&5u16.to_be_bytes()); // name
    out.extend_from_slice(&6u16.to_be_bytes()); // descriptor
    out.extend_from_slice(&1u16.to_be_bytes()); // one attribute
    out.extend_from_slice(&7u16.to_be_bytes()); // "Code"
    let code: &[u8] = &[0xb6, 0x00, 0x0c, 0xb1]; // invokevirtual #12; return
    out.extend_from_slice(&(12u32 + code.len() as u32).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // max_stack
    out.extend_from_slice(&1u16.to_be_bytes()); // max_locals
    out.extend_from_slice(&(code.len() as u32).to_be_bytes());
    out.extend_from_slice(code);
    out.extend_from_slice(&0u16.to_be_bytes()); // exception table
    out.extend_from_slice(&0u16.to_be_bytes()); // code attributes

    out.extend_from_slice(&0u16.to_be_bytes()); // class attributes
    out
}

fn push_utf8(out: &mut Vec<u8>, text: &str) {
    out.push(1);
    out.extend_from_slice(&(text.len() as u16).to_be_bytes());
    out.extend_from_slice(text.as_bytes());
}

fn push_class(out: &mut Vec<u8>, name_index: u16) {
    out.push(7);
    out.extend_from_slice(&name_index.to_be_bytes());
}
