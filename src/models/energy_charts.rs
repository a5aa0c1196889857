use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct I18nName {
    pub en: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum SeriesName {
    Single(I18nName),
    List(Vec<I18nName>),
}

impl SeriesName {
    /// English name of the series, empty if the list form carries no entries
    pub fn english(&self) -> &str {
        match self {
            SeriesName::Single(n) => &n.en,
            SeriesName::List(l) => l.first().map_or("", |n| n.en.as_str()),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct MarketSeries {
    pub name: SeriesName,
    pub data: Vec<Option<f64>>,
    #[serde(rename = "xAxisValues")]
    pub x_axis_values: Option<Vec<i64>>,
}
