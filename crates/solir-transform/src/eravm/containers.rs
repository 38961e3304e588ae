use super::constants::{
    entry_signature, is_reserved_symbol, AbiGlobals, AddrSpace, ARG_INDEX_CALLDATA_ABI,
    ARG_INDEX_CALL_FLAGS, BIT_LEN_BYTE, BIT_LEN_X32, DEPLOY_FUNC, ENTRY_FUNC, EXTRA_ABI_DATA_SIZE,
    MANDATORY_ARG_COUNT, RETURN_FUNC, RUNTIME_FUNC, RUNTIME_SUFFIX,
};
use super::CodeContext;
use crate::errors::{Result, TransformError};
use num_bigint::BigInt;
use solir_core::{
    attributes, builder::OpBuilder, Attribute, BlockId, CmpPredicate, FunctionType, InstBuilder,
    InstBuilderBase, LlvmOp, Location, Module, OpId, Type, ValueId,
};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Rewrites the top-level containers of `module` into the EraVM entry layout.
///
/// A deployable container yields `__entry`, which initializes the ABI globals
/// and dispatches on bit 0 of the call flags to `__deploy` (the container's
/// own code) or `__runtime` (the code of its `_deployed` sub-container).
pub fn lower_containers(module: &mut Module, globals: &AbiGlobals) -> Result<()> {
    let containers: Vec<OpId> = top_level_containers(module);
    if containers.is_empty() {
        return Ok(());
    }
    declare_runtime_symbols(module, globals)?;

    for container in containers {
        let name = container_name(module, container)?;
        let location = module.op(container).location.clone();
        let body = module.entry_block(container).ok_or_else(|| {
            TransformError::InternalInvariant(format!("container @{} has no body", name))
        })?;

        if name.ends_with(RUNTIME_SUFFIX) {
            let (_, runtime_body) = code_function(module, RUNTIME_FUNC, CodeContext::Runtime)?;
            move_code(module, body, runtime_body, &location)?;
            continue;
        }

        if module.lookup_top_level(ENTRY_FUNC).is_some() {
            return Err(TransformError::unsupported(
                format!("a second deployable container '{}'", name),
                &location,
            ));
        }

        let mut runtime_objects = Vec::new();
        for &op in &module.block(body).ops {
            if !module.kind(op).is_container() {
                continue;
            }
            let nested = container_name(module, op)?;
            if !nested.ends_with(RUNTIME_SUFFIX) {
                return Err(TransformError::unsupported(
                    format!(
                        "nested container '{}' without the '{}' suffix",
                        nested, RUNTIME_SUFFIX
                    ),
                    &module.op(op).location,
                ));
            }
            runtime_objects.push(op);
        }

        build_entry(module, globals, location.clone())?;

        let (_, deploy_body) = code_function(module, DEPLOY_FUNC, CodeContext::Deploy)?;
        move_code(module, body, deploy_body, &location)?;

        let (_, runtime_body) = code_function(module, RUNTIME_FUNC, CodeContext::Runtime)?;
        for object in runtime_objects {
            let object_body = module.entry_block(object).ok_or_else(|| {
                TransformError::InternalInvariant("runtime object has no body".to_string())
            })?;
            let object_location = module.op(object).location.clone();
            move_code(module, object_body, runtime_body, &object_location)?;
        }
        debug!(container = %name, "lowered deployable container");
    }

    for name in [DEPLOY_FUNC, RUNTIME_FUNC] {
        if let Some(func) = module.lookup_top_level(name) {
            terminate_code_function(module, func)?;
        }
    }
    Ok(())
}

/// Moves the functions nested in top-level containers to module scope and
/// drops the containers.
pub fn hoist_functions(module: &mut Module) -> Result<usize> {
    let mut hoisted = 0;
    for container in top_level_containers(module) {
        let functions: Vec<OpId> = module
            .walk_op(container)
            .into_iter()
            .filter(|&op| module.kind(op).is_function())
            .collect();
        for func in functions {
            let name = module.sym_name(func).unwrap_or_default().to_string();
            if module.lookup_top_level(&name).is_some() {
                let message = if is_reserved_symbol(&name) {
                    format!("function name '{}' is reserved by the EraVM ABI", name)
                } else {
                    format!("function '{}' clashes with a module-level symbol", name)
                };
                return Err(TransformError::unsupported(message, &module.op(func).location));
            }
            module.move_op_before(func, container)?;
            hoisted += 1;
        }
        module.erase_op(container)?;
    }
    trace!(hoisted, "hoisted functions to module scope");
    Ok(hoisted)
}

/// Deploy/runtime classification of every function: its `is_runtime` marker
/// when present, otherwise the name of the nearest enclosing container.
pub fn classify_functions(module: &Module) -> HashMap<OpId, CodeContext> {
    let mut contexts = HashMap::new();
    for op in module.walk() {
        if !module.kind(op).is_function() {
            continue;
        }
        let marked = module
            .attr(op, attributes::IS_RUNTIME)
            .and_then(Attribute::as_bool)
            .map(CodeContext::from_is_runtime);
        let inherited = || {
            module
                .ancestors(op)
                .into_iter()
                .find(|&a| module.kind(a).is_container())
                .and_then(|c| module.sym_name(c))
                .map(CodeContext::from_container_name)
        };
        if let Some(context) = marked.or_else(inherited) {
            contexts.insert(op, context);
        }
    }
    contexts
}

fn top_level_containers(module: &Module) -> Vec<OpId> {
    module
        .top_level_ops()
        .iter()
        .copied()
        .filter(|&op| module.kind(op).is_container())
        .collect()
}

fn container_name(module: &Module, op: OpId) -> Result<String> {
    module
        .sym_name(op)
        .map(str::to_string)
        .ok_or_else(|| TransformError::InternalInvariant(format!("{} has no symbol name", op)))
}

fn declare_runtime_symbols(module: &mut Module, globals: &AbiGlobals) -> Result<()> {
    let location = module.location().clone();
    let mut b = OpBuilder::new(module);
    b.set_location(location);
    let body = b.module().body_block();
    b.set_insertion_point_to_start(body);

    for global in globals.all() {
        if b.module().lookup_top_level(global.name).is_some() {
            continue;
        }
        let init = match &global.ty {
            Type::Int(_) => Some(Attribute::integer(0, global.ty.clone())),
            Type::Array(..) => Some(Attribute::ZeroSplat(global.ty.clone())),
            _ => None,
        };
        b.llvm_global(global.name, global.ty.clone(), "private", init)?;
    }

    if b.module().lookup_top_level(RETURN_FUNC).is_none() {
        b.llvm_func(
            RETURN_FUNC,
            FunctionType {
                inputs: vec![Type::i256(); 3],
                results: vec![],
            },
            "external",
            false,
        )?;
    }
    Ok(())
}

/// Returns `__deploy` or `__runtime`, creating it with an empty body first.
fn code_function(module: &mut Module, name: &str, context: CodeContext) -> Result<(OpId, BlockId)> {
    if let Some(func) = module.lookup_top_level(name) {
        let body = module.entry_block(func).ok_or_else(|| {
            TransformError::InternalInvariant(format!("@{} has no body", name))
        })?;
        return Ok((func, body));
    }

    let location = module.location().clone();
    let mut b = OpBuilder::new(module);
    b.set_location(location);
    let (func, body) = b.llvm_func(
        name,
        FunctionType {
            inputs: vec![],
            results: vec![],
        },
        "private",
        true,
    )?;
    let body = body.ok_or_else(|| {
        TransformError::InternalInvariant(format!("@{} was created without a body", name))
    })?;
    module.set_attr(
        func,
        attributes::IS_RUNTIME,
        Attribute::Bool(context == CodeContext::Runtime),
    );
    Ok((func, body))
}

/// Moves the code of a container (everything but functions and nested
/// containers) to the end of `to`.
fn move_code(module: &mut Module, from: BlockId, to: BlockId, location: &Location) -> Result<()> {
    let is_code = |m: &Module, op: OpId| {
        let kind = m.kind(op);
        !kind.is_function() && !kind.is_container()
    };
    let has_code = module.block(from).ops.iter().any(|&op| is_code(module, op));
    if has_code && !module.block(to).ops.is_empty() {
        return Err(TransformError::unsupported(
            "code for the same context defined by more than one container",
            location,
        ));
    }
    let moved = module.move_ops_where(from, to, is_code);
    trace!(moved = moved.len(), "relocated container code");
    Ok(())
}

/// Code that falls off the end returns empty data.
fn terminate_code_function(module: &mut Module, func: OpId) -> Result<()> {
    let Some(body) = module.entry_block(func) else {
        return Ok(());
    };
    let terminated = module
        .block(body)
        .ops
        .last()
        .map(|&op| module.kind(op).is_terminator())
        .unwrap_or(false);
    if terminated {
        return Ok(());
    }
    let location = module.op(func).location.clone();
    let mut b = OpBuilder::at_end(module, body);
    b.set_location(location);
    let zero = b.int_const(0, Type::i256())?;
    b.sol_return(zero, zero)?;
    Ok(())
}

fn build_entry(module: &mut Module, globals: &AbiGlobals, location: Location) -> Result<OpId> {
    let mut b = OpBuilder::new(module);
    b.set_location(location);
    let (entry_func, entry) = b.llvm_func(ENTRY_FUNC, entry_signature(), "external", true)?;
    let entry = entry.ok_or_else(|| {
        TransformError::InternalInvariant(format!("@{} was created without a body", ENTRY_FUNC))
    })?;
    let deploy_block = b.append_block(entry_func, 0, vec![])?;
    let runtime_block = b.append_block(entry_func, 0, vec![])?;
    b.set_insertion_point_to_end(entry);

    let args = b.block_args(entry);
    let word = Type::i256();
    let stack_ptr = AddrSpace::Stack.ptr();
    let zero = word_const(&mut b, 0)?;
    for global in globals.words() {
        let addr = b.llvm_address_of(global.name, stack_ptr.clone())?;
        b.llvm_store(zero, addr)?;
    }
    let extra = &globals.extra_abi_data;
    let extra_addr = b.llvm_address_of(extra.name, stack_ptr.clone())?;
    for slot in 0..EXTRA_ABI_DATA_SIZE {
        let ptr = array_slot(&mut b, extra_addr, &extra.ty, slot)?;
        b.llvm_store(zero, ptr)?;
    }

    let calldata = args[ARG_INDEX_CALLDATA_ABI];
    let calldata_ptr_addr = b.llvm_address_of(globals.calldata_ptr.name, stack_ptr.clone())?;
    b.llvm_store(calldata, calldata_ptr_addr)?;

    // The ABI length lives in bits 96..128 of the calldata pointer.
    let as_int = b.llvm_ptrtoint(calldata, word.clone())?;
    let shift = word_const(&mut b, BIT_LEN_X32 * 3)?;
    let shifted = b.llvm_binary(LlvmOp::LShr, as_int, shift)?;
    let mask = word_const(&mut b, i64::from(u32::MAX))?;
    let abi_len = b.llvm_binary(LlvmOp::And, shifted, mask)?;
    let calldata_size_addr = b.llvm_address_of(globals.calldata_size.name, stack_ptr.clone())?;
    b.llvm_store(abi_len, calldata_size_addr)?;

    let calldata_size = b.llvm_load(calldata_size_addr, word.clone())?;
    let return_data = b.llvm_gep(calldata, vec![calldata_size], Type::Int(BIT_LEN_BYTE))?;
    for global in [&globals.return_data_ptr, &globals.active_ptr] {
        let addr = b.llvm_address_of(global.name, stack_ptr.clone())?;
        b.llvm_store(return_data, addr)?;
    }

    let call_flags = args[ARG_INDEX_CALL_FLAGS];
    let call_flags_addr = b.llvm_address_of(globals.call_flags.name, stack_ptr)?;
    b.llvm_store(call_flags, call_flags_addr)?;

    for (slot, &arg) in args[MANDATORY_ARG_COUNT..].iter().enumerate() {
        let ptr = array_slot(&mut b, extra_addr, &extra.ty, slot)?;
        b.llvm_store(arg, ptr)?;
    }

    let one = word_const(&mut b, 1)?;
    let deploy_bit = b.llvm_binary(LlvmOp::And, call_flags, one)?;
    let is_deploy = b.llvm_icmp(CmpPredicate::Eq, deploy_bit, one)?;
    b.llvm_cond_br(is_deploy, deploy_block, runtime_block)?;

    for (block, callee) in [(deploy_block, DEPLOY_FUNC), (runtime_block, RUNTIME_FUNC)] {
        b.set_insertion_point_to_end(block);
        b.llvm_call(callee, vec![], vec![])?;
        b.llvm_unreachable()?;
    }

    trace!(args = args.len(), "built entry function");
    Ok(entry_func)
}

fn word_const(b: &mut OpBuilder<'_>, value: i64) -> solir_core::Result<ValueId> {
    b.llvm_constant(BigInt::from(value), Type::i256())
}

/// Address of element `slot` of the array global at `base`.
fn array_slot(
    b: &mut OpBuilder<'_>,
    base: ValueId,
    array_ty: &Type,
    slot: usize,
) -> solir_core::Result<ValueId> {
    let first = word_const(b, 0)?;
    let index = b.llvm_constant(BigInt::from(slot), Type::i256())?;
    b.llvm_gep(base, vec![first, index], array_ty.clone())
}
