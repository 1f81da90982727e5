//! Stage catalog: parameter schemas, defaults and ordering constraints.
//!
//! The catalog is static. Each [`StageKind`] has a fixed list of
//! [`ParamSpec`]s describing the parameter names and their legal domains,
//! and [`instantiate`] turns a raw [`StageConfig`] into a typed
//! [`StageInstance`], rejecting missing, unknown, ill-typed or
//! out-of-range values.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::stage::{
    ApproxMethod, BlurParams, ChannelRange, ContourParams, CropRect, MorphParams, StageInstance,
    StageKind, StructuringShape, Symbolic, ThresholdParams,
};
use crate::types::{ParamValue, PipelineError, StageConfig};

const CROP_OFFSET: RangeInclusive<i64> = 0..=10_000;
const CROP_EXTENT: RangeInclusive<i64> = 1..=10_000;
const BLUR_AMOUNT: RangeInclusive<f64> = 0.0..=20.0;
const MORPH_SIZE: RangeInclusive<i64> = 0..=12;
const MORPH_ITERATIONS: RangeInclusive<i64> = 1..=25;
const HUE: RangeInclusive<i64> = 0..=180;
const CHANNEL: RangeInclusive<i64> = 0..=255;

/// Legal domain of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDomain {
    /// Integer within an inclusive range.
    Integer(RangeInclusive<i64>),
    /// Real number within an inclusive range.
    Float(RangeInclusive<f64>),
    /// `[low, high]` pair within an inclusive range, `low <= high`.
    IntegerPair(RangeInclusive<i64>),
    /// One of a fixed set of symbols.
    Symbol(&'static [&'static str]),
    /// Boolean flag.
    Flag,
}

/// Name and domain of one stage parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub domain: ParamDomain,
}

impl ParamSpec {
    const fn new(name: &'static str, domain: ParamDomain) -> Self {
        Self { name, domain }
    }
}

const CROP_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("left", ParamDomain::Integer(CROP_OFFSET)),
    ParamSpec::new("top", ParamDomain::Integer(CROP_OFFSET)),
    ParamSpec::new("width", ParamDomain::Integer(CROP_EXTENT)),
    ParamSpec::new("height", ParamDomain::Integer(CROP_EXTENT)),
];

const BLUR_PARAMS: &[ParamSpec] = &[ParamSpec::new("amount", ParamDomain::Float(BLUR_AMOUNT))];

const MORPH_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("shape", ParamDomain::Symbol(StructuringShape::SYMBOLS)),
    ParamSpec::new("size", ParamDomain::Integer(MORPH_SIZE)),
    ParamSpec::new("iterations", ParamDomain::Integer(MORPH_ITERATIONS)),
];

const THRESHOLD_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("hue", ParamDomain::IntegerPair(HUE)),
    ParamSpec::new("sat", ParamDomain::IntegerPair(CHANNEL)),
    ParamSpec::new("val", ParamDomain::IntegerPair(CHANNEL)),
    ParamSpec::new("invert", ParamDomain::Flag),
];

const CONTOUR_PARAMS: &[ParamSpec] = &[ParamSpec::new(
    "method",
    ParamDomain::Symbol(ApproxMethod::SYMBOLS),
)];

/// Parameter schema for a stage kind, in display order.
#[must_use]
pub const fn parameters(kind: StageKind) -> &'static [ParamSpec] {
    match kind {
        StageKind::Crop => CROP_PARAMS,
        StageKind::Blur => BLUR_PARAMS,
        StageKind::Erode | StageKind::Dilate => MORPH_PARAMS,
        StageKind::Threshold => THRESHOLD_PARAMS,
        StageKind::Contours => CONTOUR_PARAMS,
    }
}

/// Default parameters for a freshly selected stage.
#[must_use]
pub const fn default_instance(kind: StageKind) -> StageInstance {
    match kind {
        StageKind::Crop => StageInstance::Crop(CropRect {
            left: 0,
            top: 0,
            width: 320,
            height: 240,
        }),
        StageKind::Blur => StageInstance::Blur(BlurParams { amount: 0.0 }),
        StageKind::Erode => StageInstance::Erode(MorphParams {
            shape: StructuringShape::Rect,
            size: 1,
            iterations: 5,
        }),
        StageKind::Dilate => StageInstance::Dilate(MorphParams {
            shape: StructuringShape::Rect,
            size: 1,
            iterations: 6,
        }),
        StageKind::Threshold => StageInstance::Threshold(ThresholdParams {
            hue: ChannelRange::new(61, 126),
            sat: ChannelRange::new(110, 255),
            val: ChannelRange::new(0, 255),
            invert: false,
        }),
        StageKind::Contours => StageInstance::Contours(ContourParams {
            method: ApproxMethod::All,
        }),
    }
}

/// Declarative ordering rule: `stage` requires `requires_before` to
/// appear strictly earlier in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingConstraint {
    pub stage: StageKind,
    pub requires_before: StageKind,
    /// Why the rule exists, shown to the user on violation.
    pub rationale: &'static str,
}

/// Every ordering constraint the catalog ships.
pub const ORDERING_CONSTRAINTS: &[OrderingConstraint] = &[OrderingConstraint {
    stage: StageKind::Contours,
    requires_before: StageKind::Threshold,
    rationale: "contours are traced on the binary mask that Threshold produces",
}];

impl OrderingConstraint {
    /// Check the rule against a sequence of stage kinds.
    ///
    /// Passes trivially when `stage` is absent.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::OrderingViolation`] naming both stages when
    /// `stage` is present and `requires_before` is missing or does not come
    /// strictly earlier.
    pub fn check(&self, kinds: &[StageKind]) -> Result<(), PipelineError> {
        let Some(stage_pos) = kinds.iter().position(|&k| k == self.stage) else {
            return Ok(());
        };
        let reason = match kinds.iter().position(|&k| k == self.requires_before) {
            Some(required_pos) if required_pos < stage_pos => return Ok(()),
            Some(_) => format!(
                "{} must come after {}; {}",
                self.stage, self.requires_before, self.rationale
            ),
            None => format!(
                "{} requires a {} stage earlier in the pipeline, but none is selected; {}",
                self.stage, self.requires_before, self.rationale
            ),
        };
        Err(PipelineError::OrderingViolation {
            stage: self.stage,
            other: self.requires_before,
            reason,
        })
    }
}

/// Bind a raw stage configuration to a typed [`StageInstance`].
///
/// Parameters are read in schema order, so the first failing parameter
/// is the one reported.
///
/// # Errors
///
/// - [`PipelineError::MissingParameter`] for an absent schema parameter.
/// - [`PipelineError::ParameterType`] for a value of the wrong shape.
/// - [`PipelineError::OutOfRange`] for a value outside its domain.
/// - [`PipelineError::UnknownSymbol`] for a symbol outside its table.
/// - [`PipelineError::UnknownParameter`] for a name the schema lacks.
pub fn instantiate(stage: &StageConfig) -> Result<StageInstance, PipelineError> {
    let fields = Fields {
        kind: stage.kind,
        values: &stage.params,
    };

    let instance = match stage.kind {
        StageKind::Crop => StageInstance::Crop(CropRect {
            left: fields.integer("left", &CROP_OFFSET)?,
            top: fields.integer("top", &CROP_OFFSET)?,
            width: fields.integer("width", &CROP_EXTENT)?,
            height: fields.integer("height", &CROP_EXTENT)?,
        }),
        StageKind::Blur => StageInstance::Blur(BlurParams {
            amount: fields.float("amount", &BLUR_AMOUNT)?,
        }),
        StageKind::Erode => StageInstance::Erode(fields.morph()?),
        StageKind::Dilate => StageInstance::Dilate(fields.morph()?),
        StageKind::Threshold => StageInstance::Threshold(ThresholdParams {
            hue: fields.channel_range("hue", &HUE)?,
            sat: fields.channel_range("sat", &CHANNEL)?,
            val: fields.channel_range("val", &CHANNEL)?,
            invert: fields.flag("invert")?,
        }),
        StageKind::Contours => StageInstance::Contours(ContourParams {
            method: fields.symbol("method")?,
        }),
    };

    let schema = parameters(stage.kind);
    if let Some(unknown) = stage
        .params
        .keys()
        .find(|name| !schema.iter().any(|spec| spec.name == name.as_str()))
    {
        return Err(PipelineError::UnknownParameter {
            stage: stage.kind,
            parameter: unknown.clone(),
        });
    }

    Ok(instance)
}

/// Typed accessors over one stage's raw parameters.
struct Fields<'a> {
    kind: StageKind,
    values: &'a BTreeMap<String, ParamValue>,
}

impl Fields<'_> {
    fn get(&self, name: &'static str) -> Result<&ParamValue, PipelineError> {
        self.values
            .get(name)
            .ok_or(PipelineError::MissingParameter {
                stage: self.kind,
                parameter: name,
            })
    }

    const fn wrong_type(
        &self,
        name: &'static str,
        expected: &'static str,
        found: &ParamValue,
    ) -> PipelineError {
        PipelineError::ParameterType {
            stage: self.kind,
            parameter: name,
            expected,
            found: found.type_name(),
        }
    }

    fn out_of_range(
        &self,
        name: &'static str,
        value: impl ToString,
        expected: impl ToString,
    ) -> PipelineError {
        PipelineError::OutOfRange {
            stage: self.kind,
            parameter: name,
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }

    fn integer<T: TryFrom<i64>>(
        &self,
        name: &'static str,
        domain: &RangeInclusive<i64>,
    ) -> Result<T, PipelineError> {
        let value = match self.get(name)? {
            ParamValue::Integer(v) => *v,
            other => return Err(self.wrong_type(name, "an integer", other)),
        };
        if !domain.contains(&value) {
            return Err(self.out_of_range(name, value, describe(domain)));
        }
        T::try_from(value).map_err(|_| self.out_of_range(name, value, describe(domain)))
    }

    #[allow(clippy::cast_precision_loss)]
    fn float(&self, name: &'static str, domain: &RangeInclusive<f64>) -> Result<f64, PipelineError> {
        let value = match self.get(name)? {
            ParamValue::Float(v) => *v,
            ParamValue::Integer(v) => *v as f64,
            other => return Err(self.wrong_type(name, "a number", other)),
        };
        if !domain.contains(&value) {
            return Err(self.out_of_range(name, value, describe(domain)));
        }
        Ok(value)
    }

    fn channel_range(
        &self,
        name: &'static str,
        domain: &RangeInclusive<i64>,
    ) -> Result<ChannelRange, PipelineError> {
        let [low, high] = match self.get(name)? {
            ParamValue::Range(pair) => *pair,
            other => return Err(self.wrong_type(name, "an integer pair", other)),
        };
        let in_domain = domain.contains(&low) && domain.contains(&high);
        let shown = || format!("[{low}, {high}]");
        if !in_domain || low > high {
            return Err(self.out_of_range(
                name,
                shown(),
                format!("low <= high within {}", describe(domain)),
            ));
        }
        match (u8::try_from(low), u8::try_from(high)) {
            (Ok(low), Ok(high)) => Ok(ChannelRange::new(low, high)),
            _ => Err(self.out_of_range(name, shown(), describe(domain))),
        }
    }

    fn flag(&self, name: &'static str) -> Result<bool, PipelineError> {
        match self.get(name)? {
            ParamValue::Flag(v) => Ok(*v),
            other => Err(self.wrong_type(name, "a boolean", other)),
        }
    }

    fn symbol<T: Symbolic>(&self, name: &'static str) -> Result<T, PipelineError> {
        let symbol = match self.get(name)? {
            ParamValue::Symbol(s) => s,
            other => return Err(self.wrong_type(name, "a symbol", other)),
        };
        symbol.parse().map_err(|_| PipelineError::UnknownSymbol {
            stage: self.kind,
            parameter: name,
            symbol: symbol.clone(),
            expected: T::SYMBOLS.join(", "),
        })
    }

    fn morph(&self) -> Result<MorphParams, PipelineError> {
        Ok(MorphParams {
            shape: self.symbol("shape")?,
            size: self.integer("size", &MORPH_SIZE)?,
            iterations: self.integer("iterations", &MORPH_ITERATIONS)?,
        })
    }
}

fn describe<T: std::fmt::Display>(domain: &RangeInclusive<T>) -> String {
    format!("{}..={}", domain.start(), domain.end())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn erode(shape: &str, size: i64, iterations: i64) -> StageConfig {
        StageConfig::new(StageKind::Erode)
            .with("shape", shape)
            .with("size", size)
            .with("iterations", iterations)
    }

    #[test]
    fn every_default_instance_round_trips_through_its_schema() {
        for kind in StageKind::ALL {
            let instance = default_instance(kind);
            assert_eq!(instance.kind(), kind);

            let config = StageConfig::from(instance);
            let names: Vec<_> = config.params.keys().map(String::as_str).collect();
            let mut schema: Vec<_> = parameters(kind).iter().map(|s| s.name).collect();
            schema.sort_unstable();
            assert_eq!(names, schema, "{kind} schema and defaults disagree");

            assert_eq!(instantiate(&config).unwrap(), instance);
        }
    }

    #[test]
    fn erode_binds_typed_values() {
        let instance = instantiate(&erode("CROSS", 2, 3)).unwrap();
        assert_eq!(
            instance,
            StageInstance::Erode(MorphParams {
                shape: StructuringShape::Cross,
                size: 2,
                iterations: 3,
            }),
        );
    }

    #[test]
    fn unknown_shape_symbol_is_rejected() {
        let err = instantiate(&erode("HEXAGON", 2, 3)).unwrap_err();
        assert!(
            matches!(
                err,
                PipelineError::UnknownSymbol {
                    stage: StageKind::Erode,
                    parameter: "shape",
                    ref symbol,
                    ..
                } if symbol == "HEXAGON"
            ),
            "unexpected error: {err}",
        );
        assert!(err.to_string().contains("RECT, ELLIPSE, CROSS"));
    }

    #[test]
    fn unknown_approximation_symbol_is_rejected() {
        let config = StageConfig::new(StageKind::Contours).with("method", "CHAIN FANCY");
        let err = instantiate(&config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownSymbol {
                stage: StageKind::Contours,
                parameter: "method",
                ..
            }
        ));
    }

    #[test]
    fn missing_parameter_is_reported_by_name() {
        let config = StageConfig::new(StageKind::Erode)
            .with("shape", "RECT")
            .with("iterations", 3_i64);
        let err = instantiate(&config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingParameter {
                stage: StageKind::Erode,
                parameter: "size",
            }
        ));
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let config = erode("RECT", 1, 1).with("radius", 4_i64);
        let err = instantiate(&config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownParameter { ref parameter, .. } if parameter == "radius"
        ));
    }

    #[test]
    fn wrong_value_shape_is_rejected() {
        let err = instantiate(&erode("RECT", 1, 1).with("size", "big")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ParameterType {
                parameter: "size",
                expected: "an integer",
                found: "symbol",
                ..
            }
        ));
    }

    #[test]
    fn integer_outside_domain_is_rejected() {
        let err = instantiate(&erode("RECT", 13, 1)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::OutOfRange {
                parameter: "size",
                ..
            }
        ));
        assert!(instantiate(&erode("RECT", 1, 0)).is_err());
    }

    #[test]
    fn blur_accepts_integer_amount() {
        let config = StageConfig::new(StageKind::Blur).with("amount", 3_i64);
        assert_eq!(
            instantiate(&config).unwrap(),
            StageInstance::Blur(BlurParams { amount: 3.0 }),
        );
    }

    #[test]
    fn blur_amount_above_limit_is_rejected() {
        let config = StageConfig::new(StageKind::Blur).with("amount", 20.5);
        assert!(matches!(
            instantiate(&config),
            Err(PipelineError::OutOfRange { .. })
        ));
    }

    #[test]
    fn threshold_pairs_must_be_ordered_and_in_domain() {
        let base = StageConfig::from(default_instance(StageKind::Threshold));

        let inverted = base.clone().with("sat", [200_i64, 100]);
        assert!(matches!(
            instantiate(&inverted),
            Err(PipelineError::OutOfRange {
                parameter: "sat",
                ..
            })
        ));

        let hue_too_high = base.with("hue", [0_i64, 181]);
        assert!(matches!(
            instantiate(&hue_too_high),
            Err(PipelineError::OutOfRange {
                parameter: "hue",
                ..
            })
        ));
    }

    #[test]
    fn crop_requires_positive_extent() {
        let config = StageConfig::new(StageKind::Crop)
            .with("left", 0_i64)
            .with("top", 0_i64)
            .with("width", 0_i64)
            .with("height", 10_i64);
        assert!(matches!(
            instantiate(&config),
            Err(PipelineError::OutOfRange {
                parameter: "width",
                ..
            })
        ));
    }

    #[test]
    fn symbol_domains_list_the_lookup_tables() {
        let shape = &parameters(StageKind::Erode)[0];
        assert_eq!(shape.domain, ParamDomain::Symbol(&["RECT", "ELLIPSE", "CROSS"]));
        let method = &parameters(StageKind::Contours)[0];
        assert_eq!(method.domain, ParamDomain::Symbol(ApproxMethod::SYMBOLS));
    }

    #[test]
    fn contours_constraint_passes_when_threshold_precedes() {
        let kinds = [StageKind::Threshold, StageKind::Erode, StageKind::Contours];
        assert!(ORDERING_CONSTRAINTS[0].check(&kinds).is_ok());
    }

    #[test]
    fn contours_constraint_ignores_pipelines_without_contours() {
        assert!(ORDERING_CONSTRAINTS[0].check(&[StageKind::Blur]).is_ok());
        assert!(ORDERING_CONSTRAINTS[0].check(&[]).is_ok());
    }

    #[test]
    fn contours_constraint_fails_without_threshold() {
        let err = ORDERING_CONSTRAINTS[0]
            .check(&[StageKind::Blur, StageKind::Contours])
            .unwrap_err();
        assert!(err.to_string().contains("none is selected"), "{err}");
    }

    /// Default config for `kind` with `name` replaced by `value`.
    fn with_value(kind: StageKind, name: &str, value: ParamValue) -> StageConfig {
        StageConfig::from(default_instance(kind)).with(name, value)
    }

    fn accepts(kind: StageKind, name: &str, value: ParamValue) -> bool {
        instantiate(&with_value(kind, name, value)).is_ok()
    }

    fn rejects_as_out_of_range(kind: StageKind, name: &str, value: ParamValue) -> bool {
        matches!(
            instantiate(&with_value(kind, name, value)),
            Err(PipelineError::OutOfRange { ref parameter, .. }) if *parameter == name
        )
    }

    #[test]
    fn binding_honors_every_published_domain() {
        for kind in StageKind::ALL {
            for spec in parameters(kind) {
                let name = spec.name;
                match &spec.domain {
                    ParamDomain::Integer(range) => {
                        let (lo, hi) = (*range.start(), *range.end());
                        assert!(accepts(kind, name, lo.into()), "{kind}.{name} = {lo}");
                        assert!(accepts(kind, name, hi.into()), "{kind}.{name} = {hi}");
                        assert!(rejects_as_out_of_range(kind, name, (lo - 1).into()));
                        assert!(rejects_as_out_of_range(kind, name, (hi + 1).into()));
                    }
                    ParamDomain::Float(range) => {
                        let (lo, hi) = (*range.start(), *range.end());
                        assert!(accepts(kind, name, lo.into()), "{kind}.{name} = {lo}");
                        assert!(accepts(kind, name, hi.into()), "{kind}.{name} = {hi}");
                        assert!(rejects_as_out_of_range(kind, name, (lo - 0.5).into()));
                        assert!(rejects_as_out_of_range(kind, name, (hi + 0.5).into()));
                    }
                    ParamDomain::IntegerPair(range) => {
                        let (lo, hi) = (*range.start(), *range.end());
                        assert!(accepts(kind, name, [lo, hi].into()), "{kind}.{name}");
                        assert!(rejects_as_out_of_range(kind, name, [lo - 1, hi].into()));
                        assert!(rejects_as_out_of_range(kind, name, [lo, hi + 1].into()));
                    }
                    ParamDomain::Symbol(symbols) => {
                        for &symbol in *symbols {
                            assert!(accepts(kind, name, symbol.into()), "{kind}.{name}");
                        }
                    }
                    ParamDomain::Flag => {
                        assert!(accepts(kind, name, true.into()));
                        assert!(accepts(kind, name, false.into()));
                    }
                }
            }
        }
    }
}
