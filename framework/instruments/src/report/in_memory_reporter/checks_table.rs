use tabled::Tabled;

#[derive(Tabled, Debug, Clone, PartialEq)]
pub struct CheckRow {
    #[tabled(rename = "check")]
    pub name: String,
    pub passes: usize,
    pub fails: usize,
    #[tabled(rename = "pass_rate_%")]
    #[tabled(display = "float1")]
    pub pass_rate: f64,
}

fn float1(n: &f64) -> String {
    format!("{:.1}", n)
}
