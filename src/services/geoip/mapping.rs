//! 字段映射
//!
//! 把各 provider 五花八门的 JSON 响应映射为统一字段。
//! 映射值有两种形式：
//! - `connection.isp`：按点号逐级取值
//! - `country,regionName,city`：逐个取值后拼接，跳过空值

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

/// 按点号分隔的取值路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// 解析路径，空路径返回 None
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        Some(Self {
            segments: path.split('.').map(|s| s.to_string()).collect(),
        })
    }

    /// 在 JSON 树中取值；缺失或 null 返回 None
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        match current {
            Value::Null => None,
            value => Some(value),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// 单个标准字段的取值表达式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldExpr {
    Path(FieldPath),
    Concat(Vec<FieldPath>),
}

impl FieldExpr {
    /// 拼接表达式的分隔符
    pub const CONCAT_DELIMITER: char = ',';

    /// 解析映射值；没有任何可用路径时返回 None
    pub fn parse(expr: &str) -> Option<Self> {
        if expr.contains(Self::CONCAT_DELIMITER) {
            let paths: Vec<FieldPath> = expr
                .split(Self::CONCAT_DELIMITER)
                .filter_map(FieldPath::parse)
                .collect();
            if paths.is_empty() {
                None
            } else {
                Some(Self::Concat(paths))
            }
        } else {
            FieldPath::parse(expr).map(Self::Path)
        }
    }

    /// 对原始响应求值
    ///
    /// 单路径返回原始 JSON 值；拼接返回字符串，全部为空时返回空字符串。
    pub fn evaluate(&self, raw: &Value) -> Option<Value> {
        match self {
            Self::Path(path) => path.lookup(raw).cloned(),
            Self::Concat(paths) => {
                let joined: String = paths
                    .iter()
                    .filter_map(|p| p.lookup(raw))
                    .filter_map(render_text)
                    .collect();
                Some(Value::String(joined))
            }
        }
    }
}

fn render_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// provider 的完整字段映射表（标准字段 → 表达式）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    fields: BTreeMap<String, FieldExpr>,
}

impl FieldMapping {
    /// 编译配置中的映射表，返回第一个无法解析的字段名
    pub fn compile(raw: &BTreeMap<String, String>) -> Result<Self, String> {
        let mut fields = BTreeMap::new();
        for (field, expr) in raw {
            let parsed = FieldExpr::parse(expr).ok_or_else(|| field.clone())?;
            fields.insert(field.clone(), parsed);
        }
        Ok(Self { fields })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldExpr> {
        self.fields.get(field)
    }

    /// 映射并按白名单过滤，值为空的字段直接省略
    ///
    /// 白名单为空时保留全部映射字段。
    pub fn normalize(&self, raw: &Value, allow_list: &[String]) -> Map<String, Value> {
        let mut data = Map::new();
        for (field, expr) in &self.fields {
            if !allow_list.is_empty() && !allow_list.iter().any(|f| f == field) {
                continue;
            }
            if let Some(value) = expr.evaluate(raw) {
                data.insert(field.clone(), value);
            }
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(pairs: &[(&str, &str)]) -> FieldMapping {
        let raw = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FieldMapping::compile(&raw).unwrap()
    }

    #[test]
    fn test_parse_plain_and_concat() {
        assert_eq!(
            FieldExpr::parse("connection.isp"),
            Some(FieldExpr::Path(FieldPath::parse("connection.isp").unwrap()))
        );
        match FieldExpr::parse("region, city").unwrap() {
            FieldExpr::Concat(paths) => {
                assert_eq!(paths.len(), 2);
                assert_eq!(paths[1].to_string(), "city");
            }
            other => panic!("expected concat, got {:?}", other),
        }
        assert_eq!(FieldExpr::parse(" , "), None);
        assert_eq!(FieldExpr::parse(""), None);
    }

    #[test]
    fn test_nested_lookup() {
        let raw = json!({"connection": {"isp": "Example ISP", "asn": 64500}});
        let expr = FieldExpr::parse("connection.isp").unwrap();
        assert_eq!(expr.evaluate(&raw), Some(json!("Example ISP")));

        let expr = FieldExpr::parse("connection.asn").unwrap();
        assert_eq!(expr.evaluate(&raw), Some(json!(64500)));

        let expr = FieldExpr::parse("connection.missing").unwrap();
        assert_eq!(expr.evaluate(&raw), None);

        let expr = FieldExpr::parse("connection.isp.deeper").unwrap();
        assert_eq!(expr.evaluate(&raw), None);
    }

    #[test]
    fn test_array_index_lookup() {
        let raw = json!({"ips": ["10.0.0.1", "10.0.0.2"]});
        let expr = FieldExpr::parse("ips.1").unwrap();
        assert_eq!(expr.evaluate(&raw), Some(json!("10.0.0.2")));
    }

    #[test]
    fn test_null_is_absent() {
        let raw = json!({"city": null});
        assert_eq!(FieldExpr::parse("city").unwrap().evaluate(&raw), None);
    }

    #[test]
    fn test_concat_skips_empty_values() {
        let raw = json!({"region": "CA", "city": ""});
        let expr = FieldExpr::parse("region,city").unwrap();
        assert_eq!(expr.evaluate(&raw), Some(json!("CA")));
    }

    #[test]
    fn test_concat_keeps_order_and_renders_numbers() {
        let raw = json!({"country": "中国", "region": "广东", "city": "深圳", "zip": 518000});
        let expr = FieldExpr::parse("country,region,missing,city,zip").unwrap();
        assert_eq!(expr.evaluate(&raw), Some(json!("中国广东深圳518000")));
    }

    #[test]
    fn test_concat_all_empty_yields_empty_string() {
        let raw = json!({});
        let expr = FieldExpr::parse("region,city").unwrap();
        assert_eq!(expr.evaluate(&raw), Some(json!("")));
    }

    #[test]
    fn test_normalize_filters_allow_list() {
        let m = mapping(&[("ip", "query"), ("country", "country"), ("lat", "lat")]);
        let raw = json!({"query": "1.1.1.1", "country": "AU", "lat": -33.8});
        let allow = vec!["ip".to_string(), "country".to_string()];

        let data = m.normalize(&raw, &allow);
        assert_eq!(data.len(), 2);
        assert_eq!(data["ip"], json!("1.1.1.1"));
        assert!(!data.contains_key("lat"));
    }

    #[test]
    fn test_normalize_omits_missing_fields() {
        let m = mapping(&[("ip", "query"), ("city", "city")]);
        let data = m.normalize(&json!({"query": "1.1.1.1"}), &[]);
        assert_eq!(data.len(), 1);
        assert!(!data.contains_key("city"));
    }

    #[test]
    fn test_compile_reports_bad_field() {
        let raw = [("ip".to_string(), ",".to_string())].into_iter().collect();
        assert_eq!(FieldMapping::compile(&raw).unwrap_err(), "ip");
    }
}
