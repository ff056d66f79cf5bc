use std::collections::HashMap;
use std::rc::Rc;

use diagnostics::SourceLocation;
use tracing::debug;
use vm::{NativeCall, NativeFn, Param, Value};

use crate::error::{CompileError, Result};
use crate::types::{FieldType, Type, TypeId, TypeTable};

use super::{Checker, FunctionInfo};

/// Registration of everything that can be referenced by name before any
/// body is checked.
pub trait DeclarationChecker {
    fn register_external_types(&mut self) -> Result<()>;
    fn register_external_functions(&mut self) -> Result<()>;
    fn register_records(&mut self) -> Result<()>;
    fn register_functions(&mut self) -> Result<()>;

    /// Add an external `Name(fields...)` that builds a record value.
    fn add_constructor(
        &mut self,
        record: &str,
        fields: Vec<Param>,
        location: SourceLocation,
    ) -> Result<()>;
}

impl DeclarationChecker for Checker<'_> {
    fn register_external_types(&mut self) -> Result<()> {
        let declared = self.externals.types().to_vec();
        for ext in &declared {
            self.types
                .declare_record(&ext.name, true, None)
                .map_err(|_| {
                    CompileError::at_start(format!(
                        "External type '{}' already defined.",
                        ext.name
                    ))
                })?;
        }

        // Fields may reference any external type, so resolve them only once
        // every name is known.
        for ext in &declared {
            let Some(id) = self.types.lookup(&ext.name) else {
                continue;
            };
            let mut fields: Vec<FieldType> = Vec::with_capacity(ext.fields.len());
            for field in &ext.fields {
                if fields.iter().any(|f| f.name == field.name) {
                    return Err(CompileError::at_start(format!(
                        "Duplicate field name '{}' in external type '{}'.",
                        field.name, ext.name
                    )));
                }
                let ty = self.types.lookup(&field.type_name).ok_or_else(|| {
                    CompileError::at_start(format!(
                        "Could not find type '{}' for field '{}' of external type '{}'.",
                        field.type_name, field.name, ext.name
                    ))
                })?;
                fields.push(FieldType {
                    name: field.name.clone(),
                    ty,
                });
            }
            self.types.set_fields(id, fields);

            if ext.generate_constructor {
                self.add_constructor(
                    &ext.name,
                    ext.fields.clone(),
                    SourceLocation::start_of_file(),
                )?;
            }
        }
        Ok(())
    }

    fn register_external_functions(&mut self) -> Result<()> {
        for function in self.externals.functions() {
            if self.types.lookup(&function.return_type).is_none() {
                return Err(CompileError::at_start(format!(
                    "Could not find type '{}' for return value of external function '{}'.",
                    function.return_type, function.name
                )));
            }
            for (index, param) in function.params.iter().enumerate() {
                if self.types.lookup(&param.type_name).is_none() {
                    return Err(CompileError::at_start(format!(
                        "Could not find type '{}' for argument {} of external function '{}'.",
                        param.type_name,
                        index + 1,
                        function.name
                    )));
                }
            }
        }
        debug!(
            functions = self.externals.functions().len(),
            types = self.externals.types().len(),
            "registered externals"
        );
        Ok(())
    }

    fn register_records(&mut self) -> Result<()> {
        let records = self.records;

        for record in records {
            let name = &record.name;
            if let Err(existing) =
                self.types
                    .declare_record(&name.name, false, Some(record.location))
            {
                let message = match self.types.record(existing) {
                    Some(other) if other.external => {
                        format!("Record '{}' already defined externally.", name.name)
                    }
                    Some(other) => format!(
                        "Record '{}' already defined in line {}.",
                        name.name,
                        other.location.map_or(0, |l| l.start.line)
                    ),
                    None => format!("'{}' is a built-in type.", name.name),
                };
                return Err(CompileError::new(message, name.location));
            }
        }

        for record in records {
            let Some(id) = self.types.lookup(&record.name.name) else {
                continue;
            };
            let mut fields: Vec<FieldType> = Vec::with_capacity(record.fields.len());
            let mut seen: HashMap<&str, SourceLocation> = HashMap::new();
            for field in &record.fields {
                if let Some(other) = seen.get(field.name.name.as_str()) {
                    return Err(CompileError::new(
                        format!(
                            "Duplicate field name '{}' in record '{}', see line {}, column {}.",
                            field.name.name,
                            record.name.name,
                            other.start.line,
                            other.start.column
                        ),
                        field.name.location,
                    ));
                }
                seen.insert(&field.name.name, field.name.location);

                let ty = self.types.lookup(&field.type_name.name).ok_or_else(|| {
                    CompileError::new(
                        format!(
                            "Unknown type '{}' for field '{}' of record '{}'.",
                            field.type_name.name, field.name.name, record.name.name
                        ),
                        field.type_name.location,
                    )
                })?;
                if matches!(self.types.get(ty), Type::Nothing) {
                    return Err(CompileError::new(
                        format!(
                            "Field '{}' of record '{}' can not have type 'nothing'.",
                            field.name.name, record.name.name
                        ),
                        field.type_name.location,
                    ));
                }
                fields.push(FieldType {
                    name: field.name.name.clone(),
                    ty,
                });
            }
            self.types.set_fields(id, fields);

            let params = record
                .fields
                .iter()
                .map(|f| Param::new(f.name.name.clone(), f.type_name.name.clone()))
                .collect();
            self.add_constructor(&record.name.name, params, record.name.location)?;
        }
        Ok(())
    }

    fn register_functions(&mut self) -> Result<()> {
        let functions = self.functions;

        for (index, decl) in functions.iter().enumerate() {
            let mut params: Vec<TypeId> = Vec::with_capacity(decl.params.len());
            for (i, param) in decl.params.iter().enumerate() {
                if let Some(other) = decl.params[..i]
                    .iter()
                    .find(|p| p.name.name == param.name.name)
                {
                    return Err(CompileError::new(
                        format!(
                            "Duplicate parameter name '{}' in function '{}', see line {}, column {}.",
                            param.name.name,
                            decl.name.name,
                            other.name.location.start.line,
                            other.name.location.start.column
                        ),
                        param.name.location,
                    ));
                }
                let ty = self
                    .types
                    .lookup(&param.type_name.name)
                    .filter(|ty| *ty != TypeTable::NOTHING)
                    .ok_or_else(|| {
                        CompileError::new(
                            format!(
                                "Unknown type '{}' for parameter '{}' of function '{}'.",
                                param.type_name.name, param.name.name, decl.name.name
                            ),
                            param.type_name.location,
                        )
                    })?;
                params.push(ty);
            }

            let return_type = match &decl.return_type {
                None => TypeTable::NOTHING,
                Some(name) => self.types.lookup(&name.name).ok_or_else(|| {
                    CompileError::new(
                        format!("Unknown return type '{}'.", name.name),
                        name.location,
                    )
                })?,
            };

            let param_names: Vec<String> = params.iter().map(|p| self.type_name(*p)).collect();
            let key = format!("{}({})", decl.name.name, param_names.join(","));
            let signature = if return_type == TypeTable::NOTHING {
                key.clone()
            } else {
                format!("{}:{}", key, self.type_name(return_type))
            };

            // `$main` can not be called, so it never enters the lookup.
            if index > 0 {
                if let Some(&other) = self.function_keys.get(&key) {
                    return Err(CompileError::new(
                        format!(
                            "Function '{}' already defined in line {}.",
                            key, functions[other].name.location.start.line
                        ),
                        decl.name.location,
                    ));
                }
                let param_refs: Vec<&str> = param_names.iter().map(String::as_str).collect();
                if self.externals.lookup(&decl.name.name, &param_refs).is_some() {
                    return Err(CompileError::new(
                        format!("Function '{}' already defined externally.", key),
                        decl.name.location,
                    ));
                }
                self.function_keys.insert(key.clone(), index);
            }

            let ty = self.types.function_type(params.clone(), return_type);
            self.analysis.functions.push(FunctionInfo {
                name: decl.name.name.clone(),
                key,
                signature,
                params,
                return_type,
                ty,
                locals: Vec::new(),
            });
        }
        Ok(())
    }

    fn add_constructor(
        &mut self,
        record: &str,
        fields: Vec<Param>,
        location: SourceLocation,
    ) -> Result<()> {
        let type_name: Rc<str> = Rc::from(record);
        let field_names: Rc<[String]> = fields.iter().map(|f| f.name.clone()).collect();
        let native: NativeFn = Rc::new(move |args: &[Value]| {
            Ok(NativeCall::Done(Value::record(
                type_name.clone(),
                field_names.clone(),
                args.to_vec(),
            )))
        });

        let param_types: Vec<&str> = fields.iter().map(|f| f.type_name.as_str()).collect();
        let key = format!("{}({})", record, param_types.join(","));
        if self.externals.lookup(record, &param_types).is_some() {
            return Err(CompileError::new(
                format!("Function '{}' already defined externally.", key),
                location,
            ));
        }
        self.externals
            .add_function(record, fields, record, false, native)
            .map_err(|err| CompileError::new(err.to_string(), location))?;
        Ok(())
    }
}
