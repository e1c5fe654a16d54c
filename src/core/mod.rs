pub mod aggregate;
pub mod category;
pub mod density;
pub mod primitives;
pub mod record;
pub mod scale;
pub mod types;

pub use aggregate::{
    Aggregates, CategoryCounts, CombinedPercentage, GroupedRecords, Individual, IndividualView,
    PieSlice, StackSegment, build_individuals, count_by, group_by,
};
pub use category::{AgeBucket, Category, EthnicityBucket, InterviewType, Outcome};
pub use density::{DensityFilter, DensityPoint, NormalCurve, kernel_density};
pub use record::{RawRecord, Record, normalize_records};
pub use scale::{BandScale, LinearScale, OrdinalColorScale, PieArc, SqrtScale, pie_angles};
pub use types::{Margins, Viewport};
