//! Static type descriptions.
//!
//! A described type exposes an ordered list of named fields to generic
//! code. The [`describe!`] macro implements [`Described`] together with the
//! codec traits, so the field list it is given is the single source of
//! truth for the encoding order of an aggregate.
//!
//! # Examples
//!
//! ```
//! # use fieldwire::{describe, Described};
//! #[derive(Debug, PartialEq, Eq)]
//! struct Header {
//!     version: u8,
//!     session: u32,
//! }
//!
//! describe! {
//!     Header {
//!         version: u8,
//!         session: u32,
//!     }
//! }
//!
//! // Base records encode ahead of the members and stay out of `NAMES`.
//! #[derive(Debug, PartialEq, Eq)]
//! struct Announce {
//!     header: Header,
//!     name: String,
//! }
//!
//! describe! {
//!     Announce {
//!         @base header: Header,
//!         name: String,
//!     }
//! }
//!
//! assert_eq!(Announce::NAMES, ["name"]);
//! assert_eq!(Announce::COUNT, 1);
//! ```
//!
//! Sum types get an `enum` arm with explicit, zero-based discriminants:
//!
//! ```
//! # use fieldwire::{describe, Serialize, Deserialize};
//! #[derive(Debug, PartialEq, Eq)]
//! enum Sample {
//!     Missing,
//!     Count(u32),
//!     Label(String),
//! }
//!
//! describe! {
//!     enum Sample {
//!         0 => Missing,
//!         1 => Count(u32),
//!         2 => Label(String),
//!     }
//! }
//!
//! let bytes = Sample::serialize(&Sample::Count(7)).unwrap();
//! assert_eq!(bytes, [1, 7, 0, 0, 0]);
//! ```
use crate::{
    error::{size_of_overflow, Result},
    io::{Reader, Writer},
    schema::{SchemaRead, SchemaWrite},
};

/// A type with a static, ordered description of its fields.
pub trait Described {
    /// Member field names, in declaration order (base records excluded).
    const NAMES: &'static [&'static str];
    /// Number of member fields.
    const COUNT: usize = Self::NAMES.len();

    /// Visit each base-record value, then each member value, in declared
    /// order.
    fn apply<V: Visit>(&self, visit: &mut V) -> Result<()>;

    /// As [`apply`](Described::apply), passing each field's name with its
    /// value. Base records are reported under their field name.
    fn apply_named<V: VisitNamed>(&self, visit: &mut V) -> Result<()>;
}

/// Receiver for [`Described::apply`].
pub trait Visit {
    fn field<S: SchemaWrite>(&mut self, value: &S::Src) -> Result<()>;
}

/// Receiver for [`Described::apply_named`].
pub trait VisitNamed {
    fn field<S: SchemaWrite>(&mut self, name: &'static str, value: &S::Src) -> Result<()>;
}

/// [`Visit`] implementation that encodes every visited field.
pub struct WriteVisitor<'a, W> {
    writer: &'a mut W,
}

impl<'a, W: Writer> WriteVisitor<'a, W> {
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<W: Writer> Visit for WriteVisitor<'_, W> {
    #[inline(always)]
    fn field<S: SchemaWrite>(&mut self, value: &S::Src) -> Result<()> {
        S::write(self.writer, value)
    }
}

/// [`Visit`] implementation that accumulates the encoded size of every
/// visited field.
#[derive(Default)]
pub struct SizeVisitor {
    total: usize,
}

impl SizeVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl Visit for SizeVisitor {
    #[inline(always)]
    fn field<S: SchemaWrite>(&mut self, value: &S::Src) -> Result<()> {
        self.total = self
            .total
            .checked_add(S::size_of(value)?)
            .ok_or_else(|| size_of_overflow())?;
        Ok(())
    }
}

/// Discriminants are one byte up to 255 alternatives and widen to the
/// default size width (`u32`) beyond that.
#[doc(hidden)]
pub const fn variant_tag_size(count: usize) -> usize {
    if count <= u8::MAX as usize {
        1
    } else {
        4
    }
}

#[doc(hidden)]
#[inline]
pub fn write_variant_tag(writer: &mut impl Writer, tag: usize, count: usize) -> Result<()> {
    if count <= u8::MAX as usize {
        u8::write(writer, &(tag as u8))
    } else {
        u32::write(writer, &(tag as u32))
    }
}

#[doc(hidden)]
#[inline]
pub fn read_variant_tag(reader: &mut Reader<'_>, count: usize) -> Result<usize> {
    if count <= u8::MAX as usize {
        Ok(u8::read(reader)? as usize)
    } else {
        Ok(u32::read(reader)? as usize)
    }
}

/// Implement [`Described`], [`SchemaWrite`](crate::SchemaWrite) and
/// [`SchemaRead`](crate::SchemaRead) for an aggregate by listing its
/// fields, or for a sum type by listing its alternatives.
///
/// Struct form: optional `@base` entries name fields that act as base
/// records; their encoding precedes the members and their names stay out of
/// [`Described::NAMES`]. The schema of a field may differ from the field's
/// own type to opt into wrapper treatments from
/// [`containers`](crate::containers).
///
/// Enum form: each alternative carries an explicit zero-based discriminant
/// and at most one payload type. Discriminants are encoded as a single byte
/// while there are at most 255 alternatives.
///
/// Descriptions must not change between peers; they are the wire format.
///
/// # Examples
///
/// ```
/// # use fieldwire::{describe, Serialize, Deserialize};
/// struct Point {
///     x: u64,
///     y: u64,
/// }
///
/// describe! {
///     Point {
///         x: u64,
///         y: u64,
///     }
/// }
///
/// struct Segment {
///     from: Point,
///     to: Point,
/// }
///
/// describe! {
///     Segment {
///         from: Point,
///         to: Point,
///     }
/// }
/// ```
#[macro_export]
macro_rules! describe {
    (enum $ty:ident { $($body:tt)+ }) => {
        impl $crate::SchemaWrite for $ty {
            type Src = $ty;

            fn size_of(src: &Self::Src) -> $crate::Result<usize> {
                const COUNT: usize = $crate::__variant_count!($($body)+);
                const TAG_SIZE: usize = $crate::describe::variant_tag_size(COUNT);
                $crate::__variant_size_match!(TAG_SIZE, src, $ty; [] $($body)+)
            }

            fn write(
                writer: &mut impl $crate::io::Writer,
                src: &Self::Src,
            ) -> $crate::Result<()> {
                const COUNT: usize = $crate::__variant_count!($($body)+);
                $crate::__variant_write_match!(writer, src, COUNT, $ty; [] $($body)+)
            }
        }

        impl $crate::SchemaRead for $ty {
            type Dst = $ty;

            fn read(reader: &mut $crate::io::Reader<'_>) -> $crate::Result<Self::Dst> {
                const COUNT: usize = $crate::__variant_count!($($body)+);
                let tag = $crate::describe::read_variant_tag(reader, COUNT)?;
                $crate::__variant_read_match!(reader, tag, $ty; [] $($body)+)
            }
        }
    };

    ($ty:ident { $(@base $bfield:ident : $bschema:ty,)* $($field:ident : $schema:ty),+ $(,)? }) => {
        impl $crate::Described for $ty {
            const NAMES: &'static [&'static str] = &[$(stringify!($field)),+];

            fn apply<V: $crate::Visit>(&self, visit: &mut V) -> $crate::Result<()> {
                $(visit.field::<$bschema>(&self.$bfield)?;)*
                $(visit.field::<$schema>(&self.$field)?;)+
                Ok(())
            }

            fn apply_named<V: $crate::VisitNamed>(&self, visit: &mut V) -> $crate::Result<()> {
                $(visit.field::<$bschema>(stringify!($bfield), &self.$bfield)?;)*
                $(visit.field::<$schema>(stringify!($field), &self.$field)?;)+
                Ok(())
            }
        }

        impl $crate::SchemaWrite for $ty {
            type Src = $ty;

            #[inline]
            fn size_of(src: &Self::Src) -> $crate::Result<usize> {
                let mut visitor = $crate::describe::SizeVisitor::new();
                $crate::Described::apply(src, &mut visitor)?;
                Ok(visitor.total())
            }

            #[inline]
            fn write(
                writer: &mut impl $crate::io::Writer,
                src: &Self::Src,
            ) -> $crate::Result<()> {
                let mut visitor = $crate::describe::WriteVisitor::new(writer);
                $crate::Described::apply(src, &mut visitor)
            }
        }

        impl $crate::SchemaRead for $ty {
            type Dst = $ty;

            #[inline]
            fn read(reader: &mut $crate::io::Reader<'_>) -> $crate::Result<Self::Dst> {
                Ok($ty {
                    $($bfield: <$bschema as $crate::SchemaRead>::read(reader)?,)*
                    $($field: <$schema as $crate::SchemaRead>::read(reader)?,)+
                })
            }
        }
    };
}

/// Implement the codec traits for a C-like enum encoded as its underlying
/// integer.
///
/// The enum must be `Copy` and every variant must be listed; decoding an
/// integer with no listed counterpart fails.
///
/// # Examples
///
/// ```
/// # use fieldwire::{wire_enum, Serialize, Deserialize};
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// #[repr(u16)]
/// enum Unit {
///     Celsius = 1,
///     Fahrenheit = 2,
/// }
///
/// wire_enum! {
///     Unit: u16 {
///         Celsius,
///         Fahrenheit,
///     }
/// }
///
/// assert_eq!(Unit::serialize(&Unit::Fahrenheit).unwrap(), [2, 0]);
/// ```
#[macro_export]
macro_rules! wire_enum {
    ($ty:ident : $repr:ty { $($variant:ident),+ $(,)? }) => {
        impl $crate::SchemaWrite for $ty {
            type Src = $ty;

            #[inline]
            fn size_of(_src: &Self::Src) -> $crate::Result<usize> {
                Ok(::core::mem::size_of::<$repr>())
            }

            #[inline]
            fn write(
                writer: &mut impl $crate::io::Writer,
                src: &Self::Src,
            ) -> $crate::Result<()> {
                <$repr as $crate::SchemaWrite>::write(writer, &(*src as $repr))
            }
        }

        impl $crate::SchemaRead for $ty {
            type Dst = $ty;

            fn read(reader: &mut $crate::io::Reader<'_>) -> $crate::Result<Self::Dst> {
                let raw = <$repr as $crate::SchemaRead>::read(reader)?;
                $(
                    if raw == $ty::$variant as $repr {
                        return Ok($ty::$variant);
                    }
                )+
                Err($crate::error::invalid_tag_encoding(raw as usize))
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __variant_count {
    () => { 0usize };
    ($tag:literal => $variant:ident, $($rest:tt)*) => {
        1usize + $crate::__variant_count!($($rest)*)
    };
    ($tag:literal => $variant:ident) => { 1usize };
    ($tag:literal => $variant:ident($payload:ty), $($rest:tt)*) => {
        1usize + $crate::__variant_count!($($rest)*)
    };
    ($tag:literal => $variant:ident($payload:ty)) => { 1usize };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __variant_size_match {
    ($tagsize:expr, $src:expr, $ty:ident; [$($arms:tt)*]) => {
        match $src { $($arms)* }
    };
    ($tagsize:expr, $src:expr, $ty:ident; [$($arms:tt)*] $tag:literal => $variant:ident) => {
        $crate::__variant_size_match!($tagsize, $src, $ty; [$($arms)*
            $ty::$variant => Ok($tagsize),
        ])
    };
    ($tagsize:expr, $src:expr, $ty:ident; [$($arms:tt)*] $tag:literal => $variant:ident, $($rest:tt)*) => {
        $crate::__variant_size_match!($tagsize, $src, $ty; [$($arms)*
            $ty::$variant => Ok($tagsize),
        ] $($rest)*)
    };
    ($tagsize:expr, $src:expr, $ty:ident; [$($arms:tt)*] $tag:literal => $variant:ident($payload:ty)) => {
        $crate::__variant_size_match!($tagsize, $src, $ty; [$($arms)*
            $ty::$variant(value) => {
                Ok($tagsize + <$payload as $crate::SchemaWrite>::size_of(value)?)
            },
        ])
    };
    ($tagsize:expr, $src:expr, $ty:ident; [$($arms:tt)*] $tag:literal => $variant:ident($payload:ty), $($rest:tt)*) => {
        $crate::__variant_size_match!($tagsize, $src, $ty; [$($arms)*
            $ty::$variant(value) => {
                Ok($tagsize + <$payload as $crate::SchemaWrite>::size_of(value)?)
            },
        ] $($rest)*)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __variant_write_match {
    ($writer:expr, $src:expr, $count:expr, $ty:ident; [$($arms:tt)*]) => {
        match $src { $($arms)* }
    };
    ($writer:expr, $src:expr, $count:expr, $ty:ident; [$($arms:tt)*] $tag:literal => $variant:ident) => {
        $crate::__variant_write_match!($writer, $src, $count, $ty; [$($arms)*
            $ty::$variant => $crate::describe::write_variant_tag($writer, $tag as usize, $count),
        ])
    };
    ($writer:expr, $src:expr, $count:expr, $ty:ident; [$($arms:tt)*] $tag:literal => $variant:ident, $($rest:tt)*) => {
        $crate::__variant_write_match!($writer, $src, $count, $ty; [$($arms)*
            $ty::$variant => $crate::describe::write_variant_tag($writer, $tag as usize, $count),
        ] $($rest)*)
    };
    ($writer:expr, $src:expr, $count:expr, $ty:ident; [$($arms:tt)*] $tag:literal => $variant:ident($payload:ty)) => {
        $crate::__variant_write_match!($writer, $src, $count, $ty; [$($arms)*
            $ty::$variant(value) => {
                $crate::describe::write_variant_tag($writer, $tag as usize, $count)?;
                <$payload as $crate::SchemaWrite>::write($writer, value)
            },
        ])
    };
    ($writer:expr, $src:expr, $count:expr, $ty:ident; [$($arms:tt)*] $tag:literal => $variant:ident($payload:ty), $($rest:tt)*) => {
        $crate::__variant_write_match!($writer, $src, $count, $ty; [$($arms)*
            $ty::$variant(value) => {
                $crate::describe::write_variant_tag($writer, $tag as usize, $count)?;
                <$payload as $crate::SchemaWrite>::write($writer, value)
            },
        ] $($rest)*)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __variant_read_match {
    ($reader:expr, $tag:expr, $ty:ident; [$($arms:tt)*]) => {
        match $tag {
            $($arms)*
            tag => Err($crate::error::invalid_tag_encoding(tag)),
        }
    };
    ($reader:expr, $tag:expr, $ty:ident; [$($arms:tt)*] $t:literal => $variant:ident) => {
        $crate::__variant_read_match!($reader, $tag, $ty; [$($arms)*
            $t => Ok($ty::$variant),
        ])
    };
    ($reader:expr, $tag:expr, $ty:ident; [$($arms:tt)*] $t:literal => $variant:ident, $($rest:tt)*) => {
        $crate::__variant_read_match!($reader, $tag, $ty; [$($arms)*
            $t => Ok($ty::$variant),
        ] $($rest)*)
    };
    ($reader:expr, $tag:expr, $ty:ident; [$($arms:tt)*] $t:literal => $variant:ident($payload:ty)) => {
        $crate::__variant_read_match!($reader, $tag, $ty; [$($arms)*
            $t => Ok($ty::$variant(<$payload as $crate::SchemaRead>::read($reader)?)),
        ])
    };
    ($reader:expr, $tag:expr, $ty:ident; [$($arms:tt)*] $t:literal => $variant:ident($payload:ty), $($rest:tt)*) => {
        $crate::__variant_read_match!($reader, $tag, $ty; [$($arms)*
            $t => Ok($ty::$variant(<$payload as $crate::SchemaRead>::read($reader)?)),
        ] $($rest)*)
    };
}
