//! Class records and recursive type-tree nodes.

use crate::util::{AssetReader, AssetWriter, ReadSeek, Result};

/// Flag bit: record carries an editor-variant tree.
pub const FLAG_HAS_EDITOR_NODE: u8 = 1;
/// Flag bit: record carries a release-variant tree.
pub const FLAG_HAS_RELEASE_NODE: u8 = 2;

/// One node of a class's field-layout tree.
///
/// ```text
/// typeNameIdx:u16 | fieldNameIdx:u16 | byteSize:i32 | version:u16
/// | typeFlags:u8 | metaFlag:u32 | childCount:u16 | children...
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub type_name: u16,
    pub field_name: u16,
    pub byte_size: i32,
    pub version: u16,
    pub type_flags: u8,
    pub meta_flag: u32,
    pub children: Vec<TypeNode>,
}

impl TypeNode {
    /// Read one node and its subtree.
    pub fn read<R: ReadSeek>(reader: &mut AssetReader<R>) -> Result<Self> {
        let type_name = reader.read_u16()?;
        let field_name = reader.read_u16()?;
        let byte_size = reader.read_i32()?;
        let version = reader.read_u16()?;
        let type_flags = reader.read_u8()?;
        let meta_flag = reader.read_u32()?;

        let child_count = reader.read_u16()? as usize;
        let mut children = Vec::with_capacity(child_count);
        for _ in 0..child_count {
            children.push(TypeNode::read(reader)?);
        }

        Ok(Self {
            type_name,
            field_name,
            byte_size,
            version,
            type_flags,
            meta_flag,
            children,
        })
    }

    /// Write one node and its subtree.
    pub fn write<W: std::io::Write>(&self, writer: &mut AssetWriter<W>) -> Result<()> {
        writer.write_u16(self.type_name)?;
        writer.write_u16(self.field_name)?;
        writer.write_i32(self.byte_size)?;
        writer.write_u16(self.version)?;
        writer.write_u8(self.type_flags)?;
        writer.write_u32(self.meta_flag)?;
        writer.write_u16(self.children.len() as u16)?;
        for child in &self.children {
            child.write(writer)?;
        }
        Ok(())
    }
}

/// Which schema-tree variants a class record carries.
///
/// The two flag bits make four states reachable; modeling them as one
/// enum keeps the pairing explicit and exhaustively matchable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchemaVariants {
    #[default]
    None,
    EditorOnly(TypeNode),
    ReleaseOnly(TypeNode),
    Both { editor: TypeNode, release: TypeNode },
}

impl SchemaVariants {
    /// Pick a root node. `prefer_editor` only matters when both variants
    /// exist; otherwise whichever one is present wins.
    pub fn preferred(&self, prefer_editor: bool) -> Option<&TypeNode> {
        match self {
            Self::None => None,
            Self::EditorOnly(node) => Some(node),
            Self::ReleaseOnly(node) => Some(node),
            Self::Both { editor, release } => {
                Some(if prefer_editor { editor } else { release })
            }
        }
    }

    pub fn editor(&self) -> Option<&TypeNode> {
        match self {
            Self::EditorOnly(node) | Self::Both { editor: node, .. } => Some(node),
            _ => None,
        }
    }

    pub fn release(&self) -> Option<&TypeNode> {
        match self {
            Self::ReleaseOnly(node) | Self::Both { release: node, .. } => Some(node),
            _ => None,
        }
    }

    fn flags(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::EditorOnly(_) => FLAG_HAS_EDITOR_NODE,
            Self::ReleaseOnly(_) => FLAG_HAS_RELEASE_NODE,
            Self::Both { .. } => FLAG_HAS_EDITOR_NODE | FLAG_HAS_RELEASE_NODE,
        }
    }
}

/// One class schema record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    pub class_id: i32,
    /// String-table index of the class name.
    pub name: u16,
    /// String-table index of the base class name.
    pub base_name: u16,
    pub variants: SchemaVariants,
}

impl ClassRecord {
    /// Read one record: fixed fields, then trees per the flag bits.
    pub fn read<R: ReadSeek>(reader: &mut AssetReader<R>) -> Result<Self> {
        let class_id = reader.read_i32()?;
        let name = reader.read_u16()?;
        let base_name = reader.read_u16()?;
        let flags = reader.read_u8()?;

        let editor = if flags & FLAG_HAS_EDITOR_NODE != 0 {
            Some(TypeNode::read(reader)?)
        } else {
            None
        };
        let release = if flags & FLAG_HAS_RELEASE_NODE != 0 {
            Some(TypeNode::read(reader)?)
        } else {
            None
        };

        let variants = match (editor, release) {
            (None, None) => SchemaVariants::None,
            (Some(e), None) => SchemaVariants::EditorOnly(e),
            (None, Some(r)) => SchemaVariants::ReleaseOnly(r),
            (Some(e), Some(r)) => SchemaVariants::Both {
                editor: e,
                release: r,
            },
        };

        Ok(Self {
            class_id,
            name,
            base_name,
            variants,
        })
    }

    /// Write one record.
    pub fn write<W: std::io::Write>(&self, writer: &mut AssetWriter<W>) -> Result<()> {
        writer.write_i32(self.class_id)?;
        writer.write_u16(self.name)?;
        writer.write_u16(self.base_name)?;
        writer.write_u8(self.variants.flags())?;
        if let Some(node) = self.variants.editor() {
            node.write(writer)?;
        }
        if let Some(node) = self.variants.release() {
            node.write(writer)?;
        }
        Ok(())
    }
}
