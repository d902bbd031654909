use crate::domain::pricing::PricingRule;
use crate::error::{DispatchError, Result};
use std::io::Read;

/// Reads an ordered list of pricing rules with the header
/// `id, region, base, per_km, active`. Each rule is validated as it is read.
pub struct RuleReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RuleReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    pub fn rules(self) -> impl Iterator<Item = Result<PricingRule>> {
        self.reader.into_deserialize().map(|result| {
            let rule: PricingRule = result.map_err(DispatchError::from)?;
            rule.validate()?;
            Ok(rule)
        })
    }
}
