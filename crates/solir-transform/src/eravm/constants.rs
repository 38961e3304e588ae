use solir_core::Type;

/// EraVM address spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AddrSpace {
    Stack = 0,
    Heap = 1,
    HeapAuxiliary = 2,
    Generic = 3,
    Code = 4,
    Storage = 5,
}

impl AddrSpace {
    pub fn ptr(self) -> Type {
        Type::Ptr(self as u32)
    }
}

/// How `__return` forwards its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RetForwardPageType {
    UseHeap = 0,
    ForwardFatPtr = 1,
    UseAuxHeap = 2,
}

pub const BYTE_LEN_FIELD: i64 = 32;
pub const BIT_LEN_BYTE: u16 = 8;
pub const BIT_LEN_X32: i64 = 32;

/// Aux heap offset of the constructor return data.
pub const HEAP_AUX_OFFSET_CTOR_RET_DATA: i64 = BYTE_LEN_FIELD * 8;

pub const EXTRA_ABI_DATA_SIZE: usize = 10;

pub const ARG_INDEX_CALLDATA_ABI: usize = 0;
pub const ARG_INDEX_CALL_FLAGS: usize = 1;
pub const MANDATORY_ARG_COUNT: usize = 2;

pub const ENTRY_FUNC: &str = "__entry";
pub const DEPLOY_FUNC: &str = "__deploy";
pub const RUNTIME_FUNC: &str = "__runtime";
pub const RETURN_FUNC: &str = "__return";

/// Name suffix marking the runtime object of a contract.
pub const RUNTIME_SUFFIX: &str = "_deployed";

pub const GLOB_HEAP_MEM_PTR: &str = "memory_pointer";
pub const GLOB_CALLDATA_SIZE: &str = "calldatasize";
pub const GLOB_RET_DATA_SIZE: &str = "returndatasize";
pub const GLOB_CALL_FLAGS: &str = "call_flags";
pub const GLOB_EXTRA_ABI_DATA: &str = "extra_abi_data";
pub const GLOB_CALLDATA_PTR: &str = "ptr_calldata";
pub const GLOB_RET_DATA_PTR: &str = "ptr_return_data";
pub const GLOB_ACTIVE_PTR: &str = "ptr_active";

/// A global of the entry ABI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiGlobal {
    pub name: &'static str,
    pub ty: Type,
}

/// The fixed set of globals the entry function initializes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiGlobals {
    pub heap_memory_pointer: AbiGlobal,
    pub calldata_size: AbiGlobal,
    pub return_data_size: AbiGlobal,
    pub call_flags: AbiGlobal,
    pub extra_abi_data: AbiGlobal,
    pub calldata_ptr: AbiGlobal,
    pub return_data_ptr: AbiGlobal,
    pub active_ptr: AbiGlobal,
}

impl AbiGlobals {
    pub fn new() -> Self {
        let word = |name| AbiGlobal {
            name,
            ty: Type::i256(),
        };
        let generic_ptr = |name| AbiGlobal {
            name,
            ty: AddrSpace::Generic.ptr(),
        };
        Self {
            heap_memory_pointer: word(GLOB_HEAP_MEM_PTR),
            calldata_size: word(GLOB_CALLDATA_SIZE),
            return_data_size: word(GLOB_RET_DATA_SIZE),
            call_flags: word(GLOB_CALL_FLAGS),
            extra_abi_data: AbiGlobal {
                name: GLOB_EXTRA_ABI_DATA,
                ty: Type::array(Type::i256(), EXTRA_ABI_DATA_SIZE as u64),
            },
            calldata_ptr: generic_ptr(GLOB_CALLDATA_PTR),
            return_data_ptr: generic_ptr(GLOB_RET_DATA_PTR),
            active_ptr: generic_ptr(GLOB_ACTIVE_PTR),
        }
    }

    /// Integer globals zeroed on entry.
    pub fn words(&self) -> [&AbiGlobal; 4] {
        [
            &self.heap_memory_pointer,
            &self.calldata_size,
            &self.return_data_size,
            &self.call_flags,
        ]
    }

    pub fn all(&self) -> [&AbiGlobal; 8] {
        [
            &self.heap_memory_pointer,
            &self.calldata_size,
            &self.return_data_size,
            &self.call_flags,
            &self.extra_abi_data,
            &self.calldata_ptr,
            &self.return_data_ptr,
            &self.active_ptr,
        ]
    }
}

/// Whether `name` is one of the module-level symbols the EraVM ABI declares.
pub fn is_reserved_symbol(name: &str) -> bool {
    [ENTRY_FUNC, DEPLOY_FUNC, RUNTIME_FUNC, RETURN_FUNC].contains(&name)
        || AbiGlobals::new().all().iter().any(|global| global.name == name)
}

impl Default for AbiGlobals {
    fn default() -> Self {
        Self::new()
    }
}

/// Signature of `__entry`: the calldata pointer followed by the call flags
/// and the extra ABI words.
pub fn entry_signature() -> solir_core::FunctionType {
    let mut inputs = vec![AddrSpace::Generic.ptr()];
    inputs.extend(std::iter::repeat(Type::i256()).take(MANDATORY_ARG_COUNT - 1 + EXTRA_ABI_DATA_SIZE));
    solir_core::FunctionType {
        inputs,
        results: vec![Type::i256()],
    }
}
