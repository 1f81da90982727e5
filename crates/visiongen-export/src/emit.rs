//! Code emission: validated pipeline + binding -> Java IR.
//!
//! Every stage becomes one class field and one private method built
//! from a per-kind template. Symbols map to OpenCV constants through the
//! total lookups [`shape_constant`] and [`approx_constant`].

use serde::{Deserialize, Serialize};
use tracing::debug;
use visiongen_pipeline::{
    ApproxMethod, BlurParams, ContourParams, CropRect, MorphParams, Pipeline, StageInstance,
    StageKind, StructuringShape, ThresholdParams,
};

use crate::ast::{
    ClassDecl, CompilationUnit, EntryMethod, Expr, FieldDecl, Invocation, JavaType, MethodDecl,
    Stmt,
};
use crate::bind::{Binding, FRAME_FIELD, SOURCE_IDENT, StageBinding};
use crate::error::ExportError;

/// Imports every generated file carries.
pub const IMPORTS: [&str; 11] = [
    "java.util.ArrayList",
    "java.util.List",
    "org.opencv.core.Core",
    "org.opencv.core.Mat",
    "org.opencv.core.MatOfPoint",
    "org.opencv.core.Point",
    "org.opencv.core.Rect",
    "org.opencv.core.Scalar",
    "org.opencv.core.Size",
    "org.opencv.imgproc.Imgproc",
    "org.openftc.easyopencv.OpenCvPipeline",
];

/// Channel layout of the frames the robot camera delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameFormat {
    /// EasyOpenCV's native layout.
    #[default]
    Rgba,
    Bgr,
    Rgb,
}

/// Knobs for the generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub class_name: String,
    pub package: Option<String>,
    pub frame_format: FrameFormat,
}

/// Reserved words that can never be identifiers.
const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "void", "volatile", "while", "true", "false", "null", "_",
];

/// Contextual words that are legal identifiers but not type names.
const RESTRICTED_TYPE_NAMES: &[&str] = &["var", "yield", "record", "sealed", "permits"];

/// Whether `name` is a Java identifier that is not a reserved word.
#[must_use]
pub fn is_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
    starts_well
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        && !JAVA_KEYWORDS.contains(&name)
}

impl ExportOptions {
    /// Check that the class name and package can be emitted verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidClassName`] when `class_name` is not
    /// an identifier usable as a type name, and
    /// [`ExportError::InvalidPackage`] when `package` is not a
    /// dot-separated list of identifiers.
    pub fn check(&self) -> Result<(), ExportError> {
        if !is_java_identifier(&self.class_name)
            || RESTRICTED_TYPE_NAMES.contains(&self.class_name.as_str())
        {
            return Err(ExportError::InvalidClassName(self.class_name.clone()));
        }
        if let Some(package) = &self.package
            && !package.split('.').all(is_java_identifier)
        {
            return Err(ExportError::InvalidPackage(package.clone()));
        }
        Ok(())
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            class_name: "Pipeline".to_owned(),
            package: None,
            frame_format: FrameFormat::Rgba,
        }
    }
}

/// `Imgproc` constant for a structuring element shape.
#[must_use]
pub const fn shape_constant(shape: StructuringShape) -> &'static str {
    match shape {
        StructuringShape::Rect => "Imgproc.MORPH_RECT",
        StructuringShape::Ellipse => "Imgproc.MORPH_ELLIPSE",
        StructuringShape::Cross => "Imgproc.MORPH_CROSS",
    }
}

/// `Imgproc` constant for a contour approximation method.
#[must_use]
pub const fn approx_constant(method: ApproxMethod) -> &'static str {
    match method {
        ApproxMethod::All => "Imgproc.CHAIN_APPROX_NONE",
        ApproxMethod::Simple => "Imgproc.CHAIN_APPROX_SIMPLE",
        ApproxMethod::Tc89L1 => "Imgproc.CHAIN_APPROX_TC89_L1",
        ApproxMethod::Tc89Kcos => "Imgproc.CHAIN_APPROX_TC89_KCOS",
    }
}

/// Build the compilation unit for `pipeline`.
///
/// `binding` must come from [`bind`](crate::bind::bind) on the same
/// pipeline.
#[must_use]
pub fn emit(pipeline: &Pipeline, binding: &Binding, options: &ExportOptions) -> CompilationUnit {
    let order: Vec<&str> = pipeline.kinds().map(StageKind::label).collect();
    let header = vec![format!(
        "Generated by visiongen: {}",
        if order.is_empty() {
            "no stages".to_owned()
        } else {
            order.join(" -> ")
        }
    )];

    let mut fields = vec![FieldDecl {
        ty: JavaType::Mat,
        name: FRAME_FIELD.to_owned(),
        is_final: false,
        init: None,
    }];
    let mut invocations = Vec::with_capacity(binding.stages.len());
    let mut methods = Vec::with_capacity(binding.stages.len());

    for (stage, bound) in pipeline.stages().iter().zip(&binding.stages) {
        fields.push(stage_field(bound));
        invocations.push(Invocation {
            method: bound.method.clone(),
            argument: bound.input.clone(),
        });
        let body = match stage {
            StageInstance::Crop(rect) => crop_body(bound, rect),
            StageInstance::Blur(params) => blur_body(bound, params),
            StageInstance::Erode(params) => morph_body(bound, params, "erode"),
            StageInstance::Dilate(params) => morph_body(bound, params, "dilate"),
            StageInstance::Threshold(params) => threshold_body(bound, params, options.frame_format),
            StageInstance::Contours(params) => contours_body(bound, params, binding, options),
        };
        debug!(stage = %stage.kind(), method = %bound.method, "emitted stage");
        methods.push(MethodDecl {
            name: bound.method.clone(),
            param: SOURCE_IDENT,
            body,
        });
    }

    CompilationUnit {
        header,
        package: options.package.clone(),
        imports: IMPORTS.to_vec(),
        class: ClassDecl {
            name: options.class_name.clone(),
            superclass: "OpenCvPipeline",
            fields,
            entry: EntryMethod {
                param: SOURCE_IDENT,
                frame_field: FRAME_FIELD,
                invocations,
            },
            methods,
        },
    }
}

fn stage_field(bound: &StageBinding) -> FieldDecl {
    match bound.kind {
        // Reassigned to a submatrix each frame.
        StageKind::Crop => FieldDecl {
            ty: JavaType::Mat,
            name: bound.field.clone(),
            is_final: false,
            init: Some(Expr::new_object("Mat", vec![])),
        },
        StageKind::Contours => FieldDecl {
            ty: JavaType::ContourList,
            name: bound.field.clone(),
            is_final: true,
            init: Some(Expr::new_object("ArrayList<>", vec![])),
        },
        StageKind::Blur | StageKind::Erode | StageKind::Dilate | StageKind::Threshold => {
            FieldDecl {
                ty: JavaType::Mat,
                name: bound.field.clone(),
                is_final: true,
                init: Some(Expr::new_object("Mat", vec![])),
            }
        }
    }
}

fn param() -> Expr {
    Expr::ident(SOURCE_IDENT)
}

fn local(ty: JavaType, name: &str, init: Expr) -> Stmt {
    Stmt::Local {
        ty,
        name: name.to_owned(),
        init,
    }
}

fn crop_body(bound: &StageBinding, rect: &CropRect) -> Vec<Stmt> {
    let rect_name = format!("{}Rectangle", bound.local_prefix());
    vec![
        local(
            JavaType::Rect,
            &rect_name,
            Expr::new_object(
                "Rect",
                vec![
                    Expr::Int(rect.left.into()),
                    Expr::Int(rect.top.into()),
                    Expr::Int(rect.width.into()),
                    Expr::Int(rect.height.into()),
                ],
            ),
        ),
        Stmt::Assign {
            target: Expr::This(bound.field.clone()),
            value: Expr::new_object("Mat", vec![param(), Expr::ident(rect_name)]),
        },
    ]
}

fn blur_body(bound: &StageBinding, params: &BlurParams) -> Vec<Stmt> {
    let amount = format!("{}Amount", bound.local_prefix());
    let k = i64::from(BlurParams::KERNEL_SIZE);
    vec![
        local(JavaType::Double, &amount, Expr::Double(params.amount)),
        Stmt::Expr(Expr::call(
            "Imgproc",
            "GaussianBlur",
            vec![
                param(),
                Expr::ident(&bound.field),
                Expr::new_object("Size", vec![Expr::Int(k), Expr::Int(k)]),
                Expr::ident(amount),
            ],
        )),
    ]
}

fn morph_body(bound: &StageBinding, params: &MorphParams, op: &'static str) -> Vec<Stmt> {
    let prefix = bound.local_prefix();
    let shape = format!("{prefix}Shape");
    let kernel = format!("{prefix}Kernel");
    let anchor = format!("{prefix}Anchor");
    let iterations = format!("{prefix}Iterations");
    let extent = i64::from(params.kernel_extent());
    let center = i64::from(params.anchor());

    vec![
        local(JavaType::Int, &shape, Expr::Const(shape_constant(params.shape))),
        local(
            JavaType::Size,
            &kernel,
            Expr::new_object("Size", vec![Expr::Int(extent), Expr::Int(extent)]),
        ),
        local(
            JavaType::Point,
            &anchor,
            Expr::new_object("Point", vec![Expr::Int(center), Expr::Int(center)]),
        ),
        local(JavaType::Int, &iterations, Expr::Int(params.iterations.into())),
        Stmt::Blank,
        Stmt::Expr(Expr::call(
            "Imgproc",
            op,
            vec![
                param(),
                Expr::ident(&bound.field),
                Expr::call(
                    "Imgproc",
                    "getStructuringElement",
                    vec![Expr::ident(shape), Expr::ident(kernel)],
                ),
                Expr::ident(anchor),
                Expr::ident(iterations),
            ],
        )),
    ]
}

fn scalar(values: &[u8]) -> Expr {
    Expr::new_object("Scalar", values.iter().map(|&v| Expr::Int(v.into())).collect())
}

fn threshold_body(bound: &StageBinding, params: &ThresholdParams, format: FrameFormat) -> Vec<Stmt> {
    let hsv = format!("{}Hsv", bound.local_prefix());
    let cvt = |from: Expr, code: &'static str| {
        Stmt::Expr(Expr::call(
            "Imgproc",
            "cvtColor",
            vec![from, Expr::ident(&hsv), Expr::Const(code)],
        ))
    };

    let mut body = vec![local(JavaType::Mat, &hsv, Expr::new_object("Mat", vec![]))];
    match format {
        FrameFormat::Rgba => {
            body.push(Stmt::Comment(
                "EasyOpenCV delivers RGBA frames, not BGR like normal OpenCV".to_owned(),
            ));
            body.push(cvt(param(), "Imgproc.COLOR_RGBA2RGB"));
            body.push(cvt(Expr::ident(&hsv), "Imgproc.COLOR_RGB2HSV"));
        }
        FrameFormat::Bgr => body.push(cvt(param(), "Imgproc.COLOR_BGR2HSV")),
        FrameFormat::Rgb => body.push(cvt(param(), "Imgproc.COLOR_RGB2HSV")),
    }

    body.push(Stmt::Expr(Expr::call(
        "Core",
        "inRange",
        vec![
            Expr::ident(&hsv),
            scalar(&params.lower()),
            scalar(&params.upper()),
            Expr::ident(&bound.field),
        ],
    )));
    if params.invert {
        body.push(Stmt::Expr(Expr::call(
            "Core",
            "bitwise_not",
            vec![Expr::ident(&bound.field), Expr::ident(&bound.field)],
        )));
    }
    body.push(Stmt::Expr(Expr::call(hsv, "release", vec![])));
    body
}

fn contours_body(
    bound: &StageBinding,
    params: &ContourParams,
    binding: &Binding,
    options: &ExportOptions,
) -> Vec<Stmt> {
    let hierarchy = "hierarchy";
    let frame = bound.original_frame.unwrap_or(FRAME_FIELD);

    let mut find_args = vec![
        param(),
        Expr::ident(&bound.field),
        Expr::ident(hierarchy),
        Expr::Const("Imgproc.RETR_EXTERNAL"),
        Expr::Const(approx_constant(params.method)),
    ];
    if let Some((left, top)) = binding.origin {
        find_args.push(Expr::new_object(
            "Point",
            vec![Expr::Int(left.into()), Expr::Int(top.into())],
        ));
    }

    let green: &[u8] = match options.frame_format {
        FrameFormat::Rgba => &[0, 255, 0, 255],
        FrameFormat::Bgr | FrameFormat::Rgb => &[0, 255, 0],
    };

    vec![
        Stmt::Expr(Expr::call(&bound.field, "clear", vec![])),
        local(JavaType::Mat, hierarchy, Expr::new_object("Mat", vec![])),
        Stmt::Expr(Expr::call("Imgproc", "findContours", find_args)),
        Stmt::Expr(Expr::call(hierarchy, "release", vec![])),
        Stmt::Blank,
        Stmt::Expr(Expr::call(
            "Imgproc",
            "drawContours",
            vec![
                Expr::ident(frame),
                Expr::ident(&bound.field),
                Expr::Int(-1),
                scalar(green),
                Expr::Int(3),
            ],
        )),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use visiongen_pipeline::catalog::default_instance;
    use visiongen_pipeline::{ChannelRange, PipelineConfig, Symbolic, validate};

    use super::*;
    use crate::bind::bind;

    fn unit_for(stages: impl IntoIterator<Item = StageInstance>) -> CompilationUnit {
        let pipeline = validate(&PipelineConfig::from_instances(stages)).unwrap();
        emit(&pipeline, &bind(&pipeline), &ExportOptions::default())
    }

    fn scenario_a_threshold() -> StageInstance {
        StageInstance::Threshold(ThresholdParams {
            hue: ChannelRange::new(61, 126),
            sat: ChannelRange::new(110, 255),
            val: ChannelRange::new(0, 255),
            invert: false,
        })
    }

    fn calls(method: &MethodDecl) -> Vec<&'static str> {
        method
            .body
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Expr(Expr::Call { method, .. }) => Some(*method),
                _ => None,
            })
            .collect()
    }

    fn args_of<'a>(method: &'a MethodDecl, name: &str) -> &'a [Expr] {
        method
            .body
            .iter()
            .find_map(|stmt| match stmt {
                Stmt::Expr(Expr::Call { method, args, .. }) if *method == name => {
                    Some(args.as_slice())
                }
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn one_field_and_method_per_stage_in_order() {
        let kinds = [
            StageKind::Crop,
            StageKind::Blur,
            StageKind::Threshold,
            StageKind::Erode,
            StageKind::Dilate,
            StageKind::Contours,
        ];
        let unit = unit_for(kinds.map(default_instance));
        let class = &unit.class;

        assert_eq!(class.fields.len(), kinds.len() + 1);
        assert_eq!(class.fields[0].name, FRAME_FIELD);
        assert_eq!(class.methods.len(), kinds.len());
        let names: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            ["applyCrop", "applyBlur", "applyThreshold", "applyErode", "applyDilate", "findContours"],
        );
        let invoked: Vec<_> = class.entry.invocations.iter().map(|i| i.method.as_str()).collect();
        assert_eq!(invoked, names);
    }

    #[test]
    fn invocation_arguments_follow_the_chain() {
        let unit = unit_for(
            [StageKind::Blur, StageKind::Threshold, StageKind::Dilate, StageKind::Contours]
                .map(default_instance),
        );
        let args: Vec<_> = unit
            .class
            .entry
            .invocations
            .iter()
            .map(|i| i.argument.as_str())
            .collect();
        assert_eq!(args, ["input", "blurOut", "thresholdOut", "dilateOut"]);
    }

    #[test]
    fn scenario_a_single_threshold_without_inversion() {
        let unit = unit_for([scenario_a_threshold()]);
        assert_eq!(unit.class.methods.len(), 1);
        let method = &unit.class.methods[0];
        assert_eq!(method.name, "applyThreshold");
        assert_eq!(calls(method), ["cvtColor", "cvtColor", "inRange", "release"]);

        let bounds = args_of(method, "inRange");
        assert_eq!(bounds[1], scalar(&[61, 110, 0]));
        assert_eq!(bounds[2], scalar(&[126, 255, 255]));
        assert_eq!(bounds[3], Expr::ident("thresholdOut"));
    }

    #[test]
    fn invert_emits_bitwise_not() {
        let StageInstance::Threshold(mut params) = scenario_a_threshold() else {
            unreachable!()
        };
        params.invert = true;
        let unit = unit_for([StageInstance::Threshold(params)]);
        assert!(calls(&unit.class.methods[0]).contains(&"bitwise_not"));
    }

    #[test]
    fn frame_format_selects_the_colorspace_conversion() {
        let pipeline = validate(&PipelineConfig::from_instances([scenario_a_threshold()])).unwrap();
        let options = ExportOptions {
            frame_format: FrameFormat::Bgr,
            ..ExportOptions::default()
        };
        let unit = emit(&pipeline, &bind(&pipeline), &options);
        let method = &unit.class.methods[0];
        assert_eq!(calls(method), ["cvtColor", "inRange", "release"]);
        assert_eq!(args_of(method, "cvtColor")[2], Expr::Const("Imgproc.COLOR_BGR2HSV"));
    }

    #[test]
    fn scenario_d_contours_draw_on_the_original_frame() {
        let unit = unit_for([
            scenario_a_threshold(),
            StageInstance::Contours(ContourParams {
                method: ApproxMethod::All,
            }),
        ]);
        let entry = &unit.class.entry.invocations[1];
        assert_eq!(entry.method, "findContours");
        assert_eq!(entry.argument, "thresholdOut");

        let method = &unit.class.methods[1];
        let find = args_of(method, "findContours");
        assert_eq!(find[0], Expr::ident(SOURCE_IDENT));
        assert_eq!(find[4], Expr::Const("Imgproc.CHAIN_APPROX_NONE"));
        assert_eq!(find.len(), 5);

        let draw = args_of(method, "drawContours");
        assert_eq!(draw[0], Expr::ident(FRAME_FIELD));
        assert_ne!(draw[0], Expr::ident("thresholdOut"));
    }

    #[test]
    fn crop_origin_offsets_found_contours() {
        let crop = StageInstance::Crop(CropRect {
            left: 40,
            top: 12,
            width: 200,
            height: 100,
        });
        let unit = unit_for([
            crop,
            default_instance(StageKind::Threshold),
            default_instance(StageKind::Contours),
        ]);
        let find = args_of(&unit.class.methods[2], "findContours");
        assert_eq!(
            find[5],
            Expr::new_object("Point", vec![Expr::Int(40), Expr::Int(12)]),
        );
    }

    #[test]
    fn morphology_uses_kernel_geometry() {
        let params = MorphParams {
            shape: StructuringShape::Ellipse,
            size: 2,
            iterations: 3,
        };
        let unit = unit_for([StageInstance::Dilate(params)]);
        let body = &unit.class.methods[0].body;
        assert!(body.contains(&Stmt::Local {
            ty: JavaType::Int,
            name: "dilateShape".to_owned(),
            init: Expr::Const("Imgproc.MORPH_ELLIPSE"),
        }));
        assert!(body.contains(&Stmt::Local {
            ty: JavaType::Size,
            name: "dilateKernel".to_owned(),
            init: Expr::new_object("Size", vec![Expr::Int(5), Expr::Int(5)]),
        }));
        assert!(body.contains(&Stmt::Local {
            ty: JavaType::Point,
            name: "dilateAnchor".to_owned(),
            init: Expr::new_object("Point", vec![Expr::Int(2), Expr::Int(2)]),
        }));
    }

    #[test]
    fn crop_field_is_not_final() {
        let unit = unit_for([default_instance(StageKind::Crop)]);
        let field = &unit.class.fields[1];
        assert_eq!(field.name, "cropOut");
        assert!(!field.is_final);
    }

    #[test]
    fn constant_lookups_are_total_and_injective() {
        let shapes: HashSet<_> = StructuringShape::SYMBOLS
            .iter()
            .map(|s| shape_constant(s.parse().unwrap()))
            .collect();
        assert_eq!(shapes.len(), StructuringShape::SYMBOLS.len());

        let approx: HashSet<_> = ApproxMethod::SYMBOLS
            .iter()
            .map(|s| approx_constant(s.parse().unwrap()))
            .collect();
        assert_eq!(approx.len(), ApproxMethod::SYMBOLS.len());
    }

    #[test]
    fn header_names_the_stage_order() {
        let pipeline = validate(&PipelineConfig::default()).unwrap();
        let unit = emit(&pipeline, &bind(&pipeline), &ExportOptions::default());
        assert_eq!(
            unit.header,
            ["Generated by visiongen: Threshold -> Erode -> Dilate -> Contours"],
        );
    }

    fn options(class_name: &str, package: Option<&str>) -> ExportOptions {
        ExportOptions {
            class_name: class_name.to_owned(),
            package: package.map(str::to_owned),
            ..ExportOptions::default()
        }
    }

    #[test]
    fn default_options_are_accepted() {
        assert!(ExportOptions::default().check().is_ok());
        assert!(options("Blue_Detector$2", Some("org.firstinspires.ftc.teamcode")).check().is_ok());
        assert!(options("Pipeline", Some("org.record.vision")).check().is_ok());
    }

    #[test]
    fn class_names_that_would_not_compile_are_rejected() {
        for name in ["My Pipeline", "2Pipeline", "", "class", "var", "Pipe-line", "Pipe;"] {
            assert!(
                matches!(
                    options(name, None).check(),
                    Err(ExportError::InvalidClassName(ref n)) if n == name
                ),
                "{name:?} should be rejected",
            );
        }
    }

    #[test]
    fn packages_that_would_not_compile_are_rejected() {
        for package in ["org.team; import evil", "org..team", "org.team.", "", "org.int", "1org"] {
            assert!(
                matches!(
                    options("Pipeline", Some(package)).check(),
                    Err(ExportError::InvalidPackage(ref p)) if p == package
                ),
                "{package:?} should be rejected",
            );
        }
    }
}
