//! The type registry built by the checker.
//!
//! Types live in an arena and are referred to by `TypeId`; two types are the
//! same exactly when their ids are equal. Every type is registered under its
//! canonical signature string (`number`, `Point`, `(number,string):boolean`),
//! which is also how it is shown in diagnostics.

use std::collections::HashMap;

use diagnostics::SourceLocation;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Type {
    Nothing,
    Boolean,
    Number,
    String,
    Record(RecordType),
    Function(FunctionType),
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<FieldType>,
    /// Declared by the host rather than by the program.
    pub external: bool,
    #[serde(skip)]
    pub location: Option<SourceLocation>,
}

impl RecordType {
    pub fn field(&self, name: &str) -> Option<(usize, &FieldType)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldType {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionType {
    pub params: Vec<TypeId>,
    #[serde(rename = "returnType")]
    pub return_type: TypeId,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeTable {
    types: Vec<Type>,
    #[serde(skip)]
    by_name: HashMap<String, TypeId>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub const NOTHING: TypeId = TypeId(0);
    pub const BOOLEAN: TypeId = TypeId(1);
    pub const NUMBER: TypeId = TypeId(2);
    pub const STRING: TypeId = TypeId(3);

    /// A table holding only the primitives, at their fixed ids.
    pub fn new() -> Self {
        let mut table = Self {
            types: Vec::with_capacity(16),
            by_name: HashMap::new(),
        };
        for (ty, name) in [
            (Type::Nothing, "nothing"),
            (Type::Boolean, "boolean"),
            (Type::Number, "number"),
            (Type::String, "string"),
        ] {
            table.insert(name.to_string(), ty);
        }
        table
    }

    fn insert(&mut self, name: String, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        self.by_name.insert(name, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, ty)| (TypeId(i as u32), ty))
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Canonical signature string of `id`.
    pub fn name(&self, id: TypeId) -> String {
        match self.get(id) {
            Type::Nothing => "nothing".to_string(),
            Type::Boolean => "boolean".to_string(),
            Type::Number => "number".to_string(),
            Type::String => "string".to_string(),
            Type::Record(record) => record.name.clone(),
            Type::Function(function) => self.function_signature(function),
        }
    }

    fn function_signature(&self, function: &FunctionType) -> String {
        let params: Vec<String> = function.params.iter().map(|p| self.name(*p)).collect();
        format!("({}):{}", params.join(","), self.name(function.return_type))
    }

    /// Register a record name with no fields yet. Returns the id of the type
    /// already holding that name on conflict.
    pub fn declare_record(
        &mut self,
        name: &str,
        external: bool,
        location: Option<SourceLocation>,
    ) -> Result<TypeId, TypeId> {
        if let Some(existing) = self.lookup(name) {
            return Err(existing);
        }
        Ok(self.insert(
            name.to_string(),
            Type::Record(RecordType {
                name: name.to_string(),
                fields: Vec::new(),
                external,
                location,
            }),
        ))
    }

    pub fn set_fields(&mut self, id: TypeId, fields: Vec<FieldType>) {
        if let Type::Record(record) = &mut self.types[id.index()] {
            record.fields = fields;
        }
    }

    pub fn record(&self, id: TypeId) -> Option<&RecordType> {
        match self.get(id) {
            Type::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The function type for `params -> return_type`, shared by every
    /// function with that shape.
    pub fn function_type(&mut self, params: Vec<TypeId>, return_type: TypeId) -> TypeId {
        let function = FunctionType {
            params,
            return_type,
        };
        let name = self.function_signature(&function);
        if let Some(id) = self.lookup(&name) {
            return id;
        }
        self.insert(name, Type::Function(function))
    }
}
