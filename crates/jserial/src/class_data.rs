//! Class descriptors, objects, enums, and the inheritance-chain walk.

use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

use crate::constants::{
    ALLOWED_CLASS_DESC_NAMES, CLASS_FLAGS_MASK, MIN_CLASS_NAME_LENGTH, SC_BLOCK_DATA, SC_ENUM,
    SC_EXTERNALIZABLE, SC_SERIALIZABLE, SC_WRITE_METHOD, SERIAL_VERSION_UID_LENGTH,
};
use crate::error::{ParseError, ResultExt};
use crate::parser::SerializedObjectParser;
use crate::postproc;
use crate::value::{ClassDesc, ClassDescRef, Field, ObjectRef, Record, Value};

impl<R: Read> SerializedObjectParser<R> {
    /// Reads a class descriptor, which may arrive as a new descriptor, a
    /// back-reference, or null.
    pub(crate) fn class_desc(&mut self) -> Result<Option<ClassDescRef>, ParseError> {
        let value = self
            .content(Some(&ALLOWED_CLASS_DESC_NAMES))
            .context("error reading class description")?;
        match value {
            Value::Null => Ok(None),
            Value::ClassDesc(cls) => Ok(Some(cls)),
            _ => Err(ParseError::UnexpectedContent(
                "unexpected type returned while reading class description",
            )),
        }
    }

    /// Parses a new class descriptor.
    ///
    /// The descriptor is registered as a handle right after name and
    /// serialVersionUID, before flags, fields, annotations, and super are
    /// read, so references encountered while completing it resolve to the
    /// same storage.
    pub(crate) fn parse_class_desc(&mut self) -> Result<Value, ParseError> {
        let name = self.utf().context("error reading class name")?;
        if name.len() < MIN_CLASS_NAME_LENGTH {
            return Err(ParseError::InvalidClassName(name));
        }
        let serial_version_uid = self
            .reader
            .hex(SERIAL_VERSION_UID_LENGTH)
            .context("error reading class serialVersionUID")?;
        let cls: ClassDescRef = Rc::new(RefCell::new(ClassDesc {
            name,
            serial_version_uid,
            ..Default::default()
        }));
        self.handles.register(Value::ClassDesc(cls.clone()));

        let flags = self.reader.u8().context("error reading class flags")?;
        {
            let mut cls = cls.borrow_mut();
            cls.flags = flags;
            cls.is_enum = flags & SC_ENUM != 0;
        }

        let field_count = self
            .reader
            .u16()
            .context("error reading class field count")?;
        for _ in 0..field_count {
            let field = self.field_desc().context("error reading class field")?;
            cls.borrow_mut().fields.push(field);
        }

        let annotations = self
            .annotations()
            .context("error reading class annotations")?;
        cls.borrow_mut().annotations = annotations;

        let super_class = self.class_desc().context("error reading class super")?;
        cls.borrow_mut().super_class = super_class;

        Ok(Value::ClassDesc(cls))
    }

    /// Reads a single field descriptor.
    fn field_desc(&mut self) -> Result<Field, ParseError> {
        let type_code = self.reader.u8().context("error reading field type")? as char;
        let name = self.utf().context("error reading field name")?;
        let mut field = Field {
            type_code,
            name,
            class_name: None,
        };
        if type_code == '[' || type_code == 'L' {
            let class_name = self
                .content(None)
                .context("error reading field class name")?;
            match class_name {
                Value::Str(s) => field.class_name = Some(s),
                _ => {
                    return Err(ParseError::UnexpectedContent(
                        "unexpected field class name type",
                    ))
                }
            }
        }
        Ok(field)
    }

    /// Reads content values until the EndBlockData sentinel.
    pub(crate) fn annotations(&mut self) -> Result<Vec<Value>, ParseError> {
        let mut annotations = Vec::new();
        loop {
            let annotation = self
                .content(None)
                .context("error reading class annotation")?;
            if annotation.is_end_block() {
                break;
            }
            annotations.push(annotation);
        }
        Ok(annotations)
    }

    pub(crate) fn parse_object(&mut self) -> Result<Value, ParseError> {
        let cls = self.class_desc().context("error reading object class")?;
        let mut record = Record::new();
        record.insert(
            "class",
            match &cls {
                Some(cls) => Value::ClassDesc(cls.clone()),
                None => Value::Null,
            },
        );
        record.insert("extends", Value::record(Record::new()));
        let obj = record.shared();
        // The reserved slot is filled with the live record before the
        // inheritance walk: a field referencing this very object resolves
        // to the same storage, completed by the time parsing returns.
        let slot = self.handles.reserve();
        self.handles.fill(slot, Value::Object(obj.clone()));

        let mut seen = Vec::new();
        self.recursive_class_data(cls.as_ref(), &obj, &mut seen)
            .context("error reading recursive class data")?;
        Ok(Value::Object(obj))
    }

    pub(crate) fn parse_enum(&mut self) -> Result<Value, ParseError> {
        let cls = self.class_desc().context("error parsing enum class")?;
        let slot = self.handles.reserve();
        let constant = self.content(None).context("error parsing enum constant")?;
        let mut record = Record::new();
        record.insert("value", constant);
        record.insert(
            "class",
            match cls {
                Some(cls) => Value::ClassDesc(cls),
                None => Value::Null,
            },
        );
        Ok(self.handles.fill(slot, Value::record(record)))
    }

    /// Walks the inheritance chain root-first, reading each class's data
    /// into `extends[class name]` and hoisting fields onto the flat object.
    /// Colliding names are overwritten by the deepest class, mirroring Java
    /// field shadowing.
    fn recursive_class_data(
        &mut self,
        cls: Option<&ClassDescRef>,
        obj: &ObjectRef,
        seen: &mut Vec<*const RefCell<ClassDesc>>,
    ) -> Result<(), ParseError> {
        let Some(cls) = cls else {
            return Ok(());
        };
        let ptr = Rc::as_ptr(cls);
        if !seen.contains(&ptr) {
            seen.push(ptr);
        }
        let super_class = cls.borrow().super_class.clone();
        if let Some(super_class) = super_class {
            let super_ptr = Rc::as_ptr(&super_class);
            // A chain resolved through references can loop; visit each
            // descriptor once.
            if !seen.contains(&super_ptr) {
                seen.push(super_ptr);
                self.recursive_class_data(Some(&super_class), obj, seen)?;
            }
        }

        let fields = self
            .class_data(cls)
            .context("error reading recursive class data")?;

        let extends = obj.borrow().get("extends").cloned();
        match extends {
            Some(Value::Object(extends)) => {
                let class_name = cls.borrow().name.clone();
                extends
                    .borrow_mut()
                    .insert(class_name, Value::Object(fields.clone()));
            }
            _ => return Err(ParseError::UnexpectedContent("unexpected extends value")),
        }

        let entries: Vec<(String, Value)> = fields
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut obj = obj.borrow_mut();
        for (name, value) in entries {
            obj.insert(name, value);
        }
        Ok(())
    }

    /// Reads one class's portion of an object, dispatching on the
    /// serialization-variant nibble of its flags.
    fn class_data(&mut self, cls: &ClassDescRef) -> Result<ObjectRef, ParseError> {
        let flags = cls.borrow().flags;
        match flags & CLASS_FLAGS_MASK {
            SC_SERIALIZABLE => self.field_values(cls),
            f if f == SC_SERIALIZABLE | SC_WRITE_METHOD => self.annotations_record(cls, false),
            SC_EXTERNALIZABLE => Err(ParseError::Version1ExternalUnsupported),
            f if f == SC_EXTERNALIZABLE | SC_BLOCK_DATA => self.annotations_record(cls, true),
            _ => Err(ParseError::UnknownClassFlags(flags)),
        }
    }

    /// Reads declared field values in declaration order.
    fn field_values(&mut self, cls: &ClassDescRef) -> Result<ObjectRef, ParseError> {
        let fields: Vec<Field> = cls.borrow().fields.clone();
        let mut values = Record::new();
        for field in fields {
            let value = self
                .read_primitive(field.type_code)
                .context("error reading primitive field value")?;
            values.insert(field.name, value);
        }
        Ok(values.shared())
    }

    /// Reads field values (unless `is_block`) and the trailing annotation
    /// sequence, storing the annotations under `@`, then applies any
    /// registered post-processor. Externalizable block data skips both the
    /// field values and post-processing.
    fn annotations_record(
        &mut self,
        cls: &ClassDescRef,
        is_block: bool,
    ) -> Result<ObjectRef, ParseError> {
        let data = if is_block {
            Record::new().shared()
        } else {
            self.field_values(cls)
                .context("error reading class data field values")?
        };

        let annotations = self.annotations().context("error reading annotations")?;
        data.borrow_mut()
            .insert("@", Value::Array(annotations.clone()));

        if !is_block {
            let signature = cls.borrow().signature();
            if let Some(post_proc) = postproc::lookup(&signature) {
                post_proc(&data, &annotations)?;
            }
        }
        Ok(data)
    }
}
