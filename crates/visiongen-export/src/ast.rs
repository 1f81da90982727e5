//! Intermediate representation of the generated Java class.
//!
//! The emitter builds these values; the renderer turns them into text.
//! Nothing here knows about stages.

use std::fmt;

/// The Java types that appear in generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaType {
    Mat,
    ContourList,
    Rect,
    Size,
    Point,
    Int,
    Double,
}

impl JavaType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mat => "Mat",
            Self::ContourList => "List<MatOfPoint>",
            Self::Rect => "Rect",
            Self::Size => "Size",
            Self::Point => "Point",
            Self::Int => "int",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A local, parameter or field name.
    Ident(String),
    /// `this.<field>`.
    This(String),
    /// A qualified constant such as `Imgproc.MORPH_RECT`.
    Const(&'static str),
    Int(i64),
    Double(f64),
    /// `new <class>(<args>)`.
    New {
        class: &'static str,
        args: Vec<Self>,
    },
    /// `<target>.<method>(<args>)`, or a bare call when `target` is `None`.
    Call {
        target: Option<String>,
        method: &'static str,
        args: Vec<Self>,
    },
}

impl Expr {
    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    #[must_use]
    pub const fn new_object(class: &'static str, args: Vec<Self>) -> Self {
        Self::New { class, args }
    }

    /// Static or instance call on `target`.
    #[must_use]
    pub fn call(target: impl Into<String>, method: &'static str, args: Vec<Self>) -> Self {
        Self::Call {
            target: Some(target.into()),
            method,
            args,
        }
    }
}

/// A statement in a method body.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `<ty> <name> = <init>;`
    Local { ty: JavaType, name: String, init: Expr },
    /// `<target> = <value>;`
    Assign { target: Expr, value: Expr },
    /// An expression evaluated for its effect.
    Expr(Expr),
    /// `// <text>`
    Comment(String),
    Blank,
}

/// A public field of the generated class.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub ty: JavaType,
    pub name: String,
    pub is_final: bool,
    pub init: Option<Expr>,
}

/// One call made by `processFrame`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub method: String,
    pub argument: String,
}

/// The overridden `processFrame(Mat <param>)` entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMethod {
    pub param: &'static str,
    /// Field that stores the incoming frame and is returned at the end.
    pub frame_field: &'static str,
    pub invocations: Vec<Invocation>,
}

/// A `private void <name>(Mat <param>)` stage method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub param: &'static str,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: &'static str,
    pub fields: Vec<FieldDecl>,
    pub entry: EntryMethod,
    pub methods: Vec<MethodDecl>,
}

/// A complete `.java` file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    /// Comment lines placed above everything else.
    pub header: Vec<String>,
    pub package: Option<String>,
    pub imports: Vec<&'static str>,
    pub class: ClassDecl,
}
