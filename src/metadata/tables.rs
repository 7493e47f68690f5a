//! ECMA-335 metadata: the `BSJB` root, its stream headers, and the compressed
//! (`#~`) or uncompressed (`#-`) table stream.
//!
//! Only the Assembly (0x20) and AssemblyRef (0x23) tables are decoded. Every table
//! before them still has to be sized, since rows are stored back to back and the
//! width of each column depends on heap flags and on the row counts of the tables
//! it points into.

use super::{AssemblyIdentity, MetadataError, PublicKey, Result};

const METADATA_SIGNATURE: u32 = 0x424A_5342; // "BSJB"
const TABLE_COUNT: usize = 64;

const MODULE: usize = 0x00;
const TYPE_REF: usize = 0x01;
const TYPE_DEF: usize = 0x02;
const FIELD: usize = 0x04;
const METHOD_DEF: usize = 0x06;
const PARAM: usize = 0x08;
const INTERFACE_IMPL: usize = 0x09;
const MEMBER_REF: usize = 0x0A;
const DECL_SECURITY: usize = 0x0E;
const STAND_ALONE_SIG: usize = 0x11;
const EVENT: usize = 0x14;
const PROPERTY: usize = 0x17;
const MODULE_REF: usize = 0x1A;
const TYPE_SPEC: usize = 0x1B;
pub const ASSEMBLY: usize = 0x20;
pub const ASSEMBLY_REF: usize = 0x23;
const FILE: usize = 0x26;
const EXPORTED_TYPE: usize = 0x27;
const MANIFEST_RESOURCE: usize = 0x28;
const GENERIC_PARAM: usize = 0x2A;
const METHOD_SPEC: usize = 0x2B;
const GENERIC_PARAM_CONSTRAINT: usize = 0x2C;

/// Heap-size flags of the table stream header.
const WIDE_STRINGS: u8 = 0x01;
const WIDE_GUIDS: u8 = 0x02;
const WIDE_BLOBS: u8 = 0x04;
const EXTRA_DATA: u8 = 0x40;

/// AssemblyRef flag: the blob holds a full public key, not its token.
const FLAG_PUBLIC_KEY: u32 = 0x0001;

#[derive(Debug, Clone, Copy)]
enum Coded {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    CustomAttributeType,
    ResolutionScope,
}

impl Coded {
    /// Tag width and the tables the index can point into.
    fn targets(self) -> (u32, &'static [usize]) {
        match self {
            Coded::TypeDefOrRef => (2, &[TYPE_DEF, TYPE_REF, TYPE_SPEC]),
            Coded::HasConstant => (2, &[FIELD, PARAM, PROPERTY]),
            Coded::HasCustomAttribute => (
                5,
                &[
                    METHOD_DEF,
                    FIELD,
                    TYPE_REF,
                    TYPE_DEF,
                    PARAM,
                    INTERFACE_IMPL,
                    MEMBER_REF,
                    MODULE,
                    DECL_SECURITY,
                    PROPERTY,
                    EVENT,
                    STAND_ALONE_SIG,
                    MODULE_REF,
                    TYPE_SPEC,
                    ASSEMBLY,
                    ASSEMBLY_REF,
                    FILE,
                    EXPORTED_TYPE,
                    MANIFEST_RESOURCE,
                    GENERIC_PARAM,
                    GENERIC_PARAM_CONSTRAINT,
                    METHOD_SPEC,
                ],
            ),
            Coded::HasFieldMarshal => (1, &[FIELD, PARAM]),
            Coded::HasDeclSecurity => (2, &[TYPE_DEF, METHOD_DEF, ASSEMBLY]),
            Coded::MemberRefParent => (3, &[TYPE_DEF, TYPE_REF, MODULE_REF, METHOD_DEF, TYPE_SPEC]),
            Coded::HasSemantics => (1, &[EVENT, PROPERTY]),
            Coded::MethodDefOrRef => (1, &[METHOD_DEF, MEMBER_REF]),
            Coded::MemberForwarded => (1, &[FIELD, METHOD_DEF]),
            Coded::CustomAttributeType => (3, &[METHOD_DEF, MEMBER_REF]),
            Coded::ResolutionScope => (2, &[MODULE, MODULE_REF, ASSEMBLY_REF, TYPE_REF]),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Col {
    U8,
    U16,
    U32,
    Str,
    Guid,
    Blob,
    Table(usize),
    CodedIdx(Coded),
}

use Col::*;

/// Column layout of every table up to and including AssemblyRef.
const SCHEMAS: [&[Col]; ASSEMBLY_REF + 1] = [
    /* 0x00 Module */ &[U16, Str, Guid, Guid, Guid],
    /* 0x01 TypeRef */ &[CodedIdx(Coded::ResolutionScope), Str, Str],
    /* 0x02 TypeDef */ &[U32, Str, Str, CodedIdx(Coded::TypeDefOrRef), Table(FIELD), Table(METHOD_DEF)],
    /* 0x03 FieldPtr */ &[Table(FIELD)],
    /* 0x04 Field */ &[U16, Str, Blob],
    /* 0x05 MethodPtr */ &[Table(METHOD_DEF)],
    /* 0x06 MethodDef */ &[U32, U16, U16, Str, Blob, Table(PARAM)],
    /* 0x07 ParamPtr */ &[Table(PARAM)],
    /* 0x08 Param */ &[U16, U16, Str],
    /* 0x09 InterfaceImpl */ &[Table(TYPE_DEF), CodedIdx(Coded::TypeDefOrRef)],
    /* 0x0A MemberRef */ &[CodedIdx(Coded::MemberRefParent), Str, Blob],
    /* 0x0B Constant */ &[U8, U8, CodedIdx(Coded::HasConstant), Blob],
    /* 0x0C CustomAttribute */ &[CodedIdx(Coded::HasCustomAttribute), CodedIdx(Coded::CustomAttributeType), Blob],
    /* 0x0D FieldMarshal */ &[CodedIdx(Coded::HasFieldMarshal), Blob],
    /* 0x0E DeclSecurity */ &[U16, CodedIdx(Coded::HasDeclSecurity), Blob],
    /* 0x0F ClassLayout */ &[U16, U32, Table(TYPE_DEF)],
    /* 0x10 FieldLayout */ &[U32, Table(FIELD)],
    /* 0x11 StandAloneSig */ &[Blob],
    /* 0x12 EventMap */ &[Table(TYPE_DEF), Table(EVENT)],
    /* 0x13 EventPtr */ &[Table(EVENT)],
    /* 0x14 Event */ &[U16, Str, CodedIdx(Coded::TypeDefOrRef)],
    /* 0x15 PropertyMap */ &[Table(TYPE_DEF), Table(PROPERTY)],
    /* 0x16 PropertyPtr */ &[Table(PROPERTY)],
    /* 0x17 Property */ &[U16, Str, Blob],
    /* 0x18 MethodSemantics */ &[U16, Table(METHOD_DEF), CodedIdx(Coded::HasSemantics)],
    /* 0x19 MethodImpl */ &[Table(TYPE_DEF), CodedIdx(Coded::MethodDefOrRef), CodedIdx(Coded::MethodDefOrRef)],
    /* 0x1A ModuleRef */ &[Str],
    /* 0x1B TypeSpec */ &[Blob],
    /* 0x1C ImplMap */ &[U16, CodedIdx(Coded::MemberForwarded), Str, Table(MODULE_REF)],
    /* 0x1D FieldRVA */ &[U32, Table(FIELD)],
    /* 0x1E EncLog */ &[U32, U32],
    /* 0x1F EncMap */ &[U32],
    /* 0x20 Assembly */ &[U32, U16, U16, U16, U16, U32, Blob, Str, Str],
    /* 0x21 AssemblyProcessor */ &[U32],
    /* 0x22 AssemblyOS */ &[U32, U32, U32],
    /* 0x23 AssemblyRef */ &[U16, U16, U16, U16, U32, Blob, Str, Str, Blob],
];

/// Little-endian reader over a byte slice that reports truncation instead of panicking.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize, what: &'static str) -> Self {
        Reader { data, pos, what }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.data.len());
        match end {
            Some(end) => {
                let bytes = &self.data[self.pos..end];
                self.pos = end;
                Ok(bytes)
            }
            None => Err(MetadataError::Truncated(self.what)),
        }
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64> {
        let lo = self.u32()? as u64;
        let hi = self.u32()? as u64;
        Ok(lo | (hi << 32))
    }

    /// A heap or table index stored in 2 or 4 bytes.
    fn index(&mut self, width: usize) -> Result<u32> {
        if width == 2 { Ok(self.u16()? as u32) } else { self.u32() }
    }
}

/// Row counts and heap widths: everything needed to size a table row.
struct Layout {
    rows: [u32; TABLE_COUNT],
    heap_sizes: u8,
}

impl Layout {
    fn heap_width(&self, flag: u8) -> usize {
        if self.heap_sizes & flag != 0 { 4 } else { 2 }
    }

    fn table_width(&self, table: usize) -> usize {
        if self.rows[table] < 0x1_0000 { 2 } else { 4 }
    }

    fn coded_width(&self, coded: Coded) -> usize {
        let (tag_bits, tables) = coded.targets();
        let max_rows = tables.iter().map(|t| self.rows[*t]).max().unwrap_or(0);
        if max_rows < (1u32 << (16 - tag_bits)) { 2 } else { 4 }
    }

    fn column_width(&self, col: Col) -> usize {
        match col {
            U8 => 1,
            U16 => 2,
            U32 => 4,
            Str => self.heap_width(WIDE_STRINGS),
            Guid => self.heap_width(WIDE_GUIDS),
            Blob => self.heap_width(WIDE_BLOBS),
            Table(t) => self.table_width(t),
            CodedIdx(c) => self.coded_width(c),
        }
    }

    fn row_width(&self, table: usize) -> usize {
        SCHEMAS[table].iter().map(|c| self.column_width(*c)).sum()
    }
}

/// A parsed metadata root with the heaps and table offsets needed to read
/// assembly identities.
pub struct MetadataRoot<'a> {
    pub runtime_version: String,
    strings: &'a [u8],
    blobs: &'a [u8],
    tables: &'a [u8],
    layout: Layout,
    /// Offset of each table's first row within `tables`, for tables up to AssemblyRef.
    table_offsets: [usize; ASSEMBLY_REF + 1],
}

impl<'a> MetadataRoot<'a> {
    pub fn parse(root: &'a [u8]) -> Result<Self> {
        let mut r = Reader::new(root, 0, "metadata root");
        if r.u32()? != METADATA_SIGNATURE {
            return Err(MetadataError::Malformed("missing BSJB metadata signature".to_string()));
        }
        let _major = r.u16()?;
        let _minor = r.u16()?;
        let _reserved = r.u32()?;
        let version_len = r.u32()? as usize;
        let version_bytes = r.take(version_len)?;
        let runtime_version = String::from_utf8_lossy(version_bytes)
            .trim_end_matches('\0')
            .to_string();
        let _flags = r.u16()?;
        let stream_count = r.u16()?;

        let mut strings: &[u8] = &[];
        let mut blobs: &[u8] = &[];
        let mut tables: Option<&[u8]> = None;
        for _ in 0..stream_count {
            let offset = r.u32()? as usize;
            let size = r.u32()? as usize;
            let name = read_stream_name(&mut r)?;
            let data = offset
                .checked_add(size)
                .and_then(|end| root.get(offset..end))
                .ok_or(MetadataError::Truncated("metadata stream"))?;
            match name.as_str() {
                "#Strings" => strings = data,
                "#Blob" => blobs = data,
                "#~" | "#-" => tables = Some(data),
                _ => {}
            }
        }
        let tables = tables.ok_or_else(|| MetadataError::Malformed("no metadata table stream".to_string()))?;

        let mut t = Reader::new(tables, 0, "table stream header");
        let _reserved = t.u32()?;
        let _major = t.u8()?;
        let _minor = t.u8()?;
        let heap_sizes = t.u8()?;
        let _reserved = t.u8()?;
        let valid = t.u64()?;
        let _sorted = t.u64()?;

        let mut rows = [0u32; TABLE_COUNT];
        for (table, count) in rows.iter_mut().enumerate() {
            if valid & (1u64 << table) != 0 {
                *count = t.u32()?;
            }
        }
        if heap_sizes & EXTRA_DATA != 0 {
            t.take(4)?;
        }

        let layout = Layout { rows, heap_sizes };
        let mut table_offsets = [0usize; ASSEMBLY_REF + 1];
        let mut offset = t.pos;
        for (table, start) in table_offsets.iter_mut().enumerate() {
            *start = offset;
            offset += layout.rows[table] as usize * layout.row_width(table);
        }

        Ok(MetadataRoot {
            runtime_version,
            strings,
            blobs,
            tables,
            layout,
            table_offsets,
        })
    }

    fn row_reader(&self, table: usize, row: u32) -> Reader<'a> {
        let start = self.table_offsets[table] + row as usize * self.layout.row_width(table);
        Reader::new(self.tables, start, "metadata table row")
    }

    fn string(&self, index: u32) -> Result<String> {
        let start = index as usize;
        let rest = self
            .strings
            .get(start..)
            .ok_or(MetadataError::Truncated("#Strings heap"))?;
        let end = rest.iter().position(|b| *b == 0).unwrap_or(rest.len());
        Ok(String::from_utf8_lossy(&rest[..end]).into_owned())
    }

    fn blob(&self, index: u32) -> Result<&'a [u8]> {
        let mut r = Reader::new(self.blobs, index as usize, "#Blob heap");
        if index == 0 {
            return Ok(&[]);
        }
        let first = r.u8()?;
        let len = if first & 0x80 == 0 {
            first as usize
        } else if first & 0xC0 == 0x80 {
            (((first & 0x3F) as usize) << 8) | r.u8()? as usize
        } else if first & 0xE0 == 0xC0 {
            let b = r.take(3)?;
            (((first & 0x1F) as usize) << 24) | ((b[0] as usize) << 16) | ((b[1] as usize) << 8) | b[2] as usize
        } else {
            return Err(MetadataError::Malformed(format!("bad blob length prefix 0x{first:02x}")));
        };
        r.take(len)
    }

    fn version(r: &mut Reader) -> Result<[u16; 4]> {
        Ok([r.u16()?, r.u16()?, r.u16()?, r.u16()?])
    }

    /// The identity declared in the Assembly table; `None` for a bare module.
    pub fn assembly(&self) -> Result<Option<AssemblyIdentity>> {
        if self.layout.rows[ASSEMBLY] == 0 {
            return Ok(None);
        }
        let l = &self.layout;
        let mut r = self.row_reader(ASSEMBLY, 0);
        let _hash_alg = r.u32()?;
        let version = Self::version(&mut r)?;
        let _flags = r.u32()?;
        let key = self.blob(r.index(l.heap_width(WIDE_BLOBS))?)?;
        let name = self.string(r.index(l.heap_width(WIDE_STRINGS))?)?;
        let culture = self.string(r.index(l.heap_width(WIDE_STRINGS))?)?;
        Ok(Some(AssemblyIdentity {
            name,
            version,
            culture,
            public_key: PublicKey::from_blob(key, true),
        }))
    }

    /// Every row of the AssemblyRef table, in table order.
    pub fn assembly_refs(&self) -> Result<Vec<AssemblyIdentity>> {
        let l = &self.layout;
        (0..l.rows[ASSEMBLY_REF])
            .map(|row| {
                let mut r = self.row_reader(ASSEMBLY_REF, row);
                let version = Self::version(&mut r)?;
                let flags = r.u32()?;
                let key = self.blob(r.index(l.heap_width(WIDE_BLOBS))?)?;
                let name = self.string(r.index(l.heap_width(WIDE_STRINGS))?)?;
                let culture = self.string(r.index(l.heap_width(WIDE_STRINGS))?)?;
                Ok(AssemblyIdentity {
                    name,
                    version,
                    culture,
                    public_key: PublicKey::from_blob(key, flags & FLAG_PUBLIC_KEY != 0),
                })
            })
            .collect()
    }
}

/// Reads a null-terminated stream name padded to a 4-byte boundary.
fn read_stream_name(r: &mut Reader) -> Result<String> {
    let mut name = Vec::new();
    loop {
        let b = r.u8()?;
        if b == 0 {
            break;
        }
        name.push(b);
    }
    let consumed = name.len() + 1;
    let padding = (4 - consumed % 4) % 4;
    r.take(padding)?;
    Ok(String::from_utf8_lossy(&name).into_owned())
}

#[cfg(test)]
pub(crate) mod fixture {
    //! Builds minimal metadata roots for tests.

    pub struct Reference<'a> {
        pub name: &'a str,
        pub version: [u16; 4],
        pub token: &'a [u8],
    }

    fn push_string(heap: &mut Vec<u8>, s: &str) -> u16 {
        if s.is_empty() {
            return 0;
        }
        let offset = heap.len() as u16;
        heap.extend_from_slice(s.as_bytes());
        heap.push(0);
        offset
    }

    fn push_blob(heap: &mut Vec<u8>, bytes: &[u8]) -> u16 {
        if bytes.is_empty() {
            return 0;
        }
        let offset = heap.len() as u16;
        heap.push(bytes.len() as u8);
        heap.extend_from_slice(bytes);
        offset
    }

    fn pad4(v: &mut Vec<u8>) {
        while v.len() % 4 != 0 {
            v.push(0);
        }
    }

    /// A root with one Module row, one Assembly row and the given references.
    pub fn metadata_root(name: &str, version: [u16; 4], references: &[Reference]) -> Vec<u8> {
        let mut strings = vec![0u8];
        let mut blobs = vec![0u8];

        let module_name = push_string(&mut strings, &format!("{name}.dll"));
        let asm_name = push_string(&mut strings, name);

        let mut tables = Vec::new();
        tables.extend_from_slice(&0u32.to_le_bytes());
        tables.extend_from_slice(&[2, 0, 0, 1]);
        let valid: u64 = (1 << 0x00) | (1 << 0x20) | (1 << 0x23);
        tables.extend_from_slice(&valid.to_le_bytes());
        tables.extend_from_slice(&0u64.to_le_bytes());
        tables.extend_from_slice(&1u32.to_le_bytes());
        tables.extend_from_slice(&1u32.to_le_bytes());
        tables.extend_from_slice(&(references.len() as u32).to_le_bytes());

        // Module
        tables.extend_from_slice(&0u16.to_le_bytes());
        tables.extend_from_slice(&module_name.to_le_bytes());
        tables.extend_from_slice(&[0; 6]);

        // Assembly
        tables.extend_from_slice(&0x8004u32.to_le_bytes());
        for part in version {
            tables.extend_from_slice(&part.to_le_bytes());
        }
        tables.extend_from_slice(&0u32.to_le_bytes());
        tables.extend_from_slice(&0u16.to_le_bytes());
        tables.extend_from_slice(&asm_name.to_le_bytes());
        tables.extend_from_slice(&0u16.to_le_bytes());

        // AssemblyRef
        for reference in references {
            let ref_name = push_string(&mut strings, reference.name);
            let token = push_blob(&mut blobs, reference.token);
            for part in reference.version {
                tables.extend_from_slice(&part.to_le_bytes());
            }
            tables.extend_from_slice(&0u32.to_le_bytes());
            tables.extend_from_slice(&token.to_le_bytes());
            tables.extend_from_slice(&ref_name.to_le_bytes());
            tables.extend_from_slice(&0u16.to_le_bytes());
            tables.extend_from_slice(&0u16.to_le_bytes());
        }

        pad4(&mut tables);
        pad4(&mut strings);
        pad4(&mut blobs);

        let version_string = b"v4.0.30319\0\0";
        let streams: [(&[u8], &Vec<u8>); 3] = [(b"#~\0\0", &tables), (b"#Strings\0\0\0\0", &strings), (b"#Blob\0\0\0", &blobs)];
        let header_len = 16 + version_string.len() + 4 + streams.iter().map(|(n, _)| 8 + n.len()).sum::<usize>();

        let mut root = Vec::new();
        root.extend_from_slice(&0x424A_5342u32.to_le_bytes());
        root.extend_from_slice(&1u16.to_le_bytes());
        root.extend_from_slice(&1u16.to_le_bytes());
        root.extend_from_slice(&0u32.to_le_bytes());
        root.extend_from_slice(&(version_string.len() as u32).to_le_bytes());
        root.extend_from_slice(version_string);
        root.extend_from_slice(&0u16.to_le_bytes());
        root.extend_from_slice(&(streams.len() as u16).to_le_bytes());

        let mut offset = header_len;
        for (stream_name, data) in &streams {
            root.extend_from_slice(&(offset as u32).to_le_bytes());
            root.extend_from_slice(&(data.len() as u32).to_le_bytes());
            root.extend_from_slice(stream_name);
            offset += data.len();
        }
        for (_, data) in &streams {
            root.extend_from_slice(data);
        }
        root
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::{Reference, metadata_root};
    use super::*;

    const TOKEN: [u8; 8] = [0xb0, 0x3f, 0x5f, 0x7f, 0x11, 0xd5, 0x0a, 0x3a];

    #[test]
    fn reads_identity_and_references() {
        let bytes = metadata_root(
            "Sample",
            [1, 2, 3, 4],
            &[
                Reference { name: "System.Runtime", version: [6, 0, 0, 0], token: &TOKEN },
                Reference { name: "Contracts", version: [1, 0, 0, 0], token: &[] },
            ],
        );

        let root = MetadataRoot::parse(&bytes).unwrap();
        assert_eq!(root.runtime_version, "v4.0.30319");

        let identity = root.assembly().unwrap().unwrap();
        assert_eq!(identity.name, "Sample");
        assert_eq!(identity.version, [1, 2, 3, 4]);
        assert_eq!(identity.public_key, PublicKey::None);

        let refs = root.assembly_refs().unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "System.Runtime");
        assert_eq!(refs[0].public_key, PublicKey::Token(TOKEN.to_vec()));
        assert_eq!(refs[1].version, [1, 0, 0, 0]);
        assert_eq!(refs[1].culture, "");
    }

    #[test]
    fn rejects_missing_signature() {
        let mut bytes = metadata_root("Sample", [1, 0, 0, 0], &[]);
        bytes[0] = b'X';
        assert!(matches!(MetadataRoot::parse(&bytes), Err(MetadataError::Malformed(_))));
    }

    #[test]
    fn truncated_root_is_reported() {
        let bytes = metadata_root("Sample", [1, 0, 0, 0], &[]);
        assert!(matches!(
            MetadataRoot::parse(&bytes[..24]),
            Err(MetadataError::Truncated(_))
        ));
    }

    #[test]
    fn coded_index_widens_with_row_counts() {
        let mut rows = [0u32; TABLE_COUNT];
        let narrow = Layout { rows, heap_sizes: 0 };
        assert_eq!(narrow.coded_width(Coded::ResolutionScope), 2);

        rows[TYPE_REF] = 1 << 14;
        let wide = Layout { rows, heap_sizes: WIDE_STRINGS };
        assert_eq!(wide.coded_width(Coded::ResolutionScope), 4);
        assert_eq!(wide.row_width(TYPE_REF), 4 + 4 + 4);
        assert_eq!(wide.row_width(ASSEMBLY_REF), 8 + 4 + 2 + 4 + 4 + 2);
    }
}
