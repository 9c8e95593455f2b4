use crate::Product;

/// Message shown in place of the grid when nothing matches.
pub const NO_MATCHES: &str = "No products found. Try another category or search.";

/// Category and keyword criteria driving the product grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    category: Option<String>,
    search_keyword: String,
}

impl FilterState {
    pub fn new(category: Option<&str>, keyword: &str) -> Self {
        let mut state = Self::default();
        state.set_category(category);
        state.set_search(keyword);
        state
    }

    /// An empty string clears the category.
    pub fn set_category(&mut self, category: Option<&str>) {
        self.category = category.filter(|c| !c.is_empty()).map(str::to_string);
    }

    /// Stored trimmed and lower-cased.
    pub fn set_search(&mut self, keyword: &str) {
        self.search_keyword = keyword.trim().to_lowercase();
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = self.category.as_deref().is_none_or(|c| product.category == c);
        let keyword_ok = self.search_keyword.is_empty()
            || product.name.to_lowercase().contains(&self.search_keyword)
            || product.description.to_lowercase().contains(&self.search_keyword);
        category_ok && keyword_ok
    }
}

/// Products passing the filter, in catalog order.
pub fn filtered_view<'a>(products: &'a [Product], filter: &FilterState) -> Vec<&'a Product> {
    products.iter().filter(|p| filter.matches(p)).collect()
}

/// Distinct categories in first-seen order.
pub fn categories(products: &[Product]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for p in products {
        if !seen.contains(&p.category.as_str()) {
            seen.push(&p.category);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::sample;

    fn catalog() -> Vec<Product> {
        vec![
            sample("Hydrating Cleanser", "cleanser", "Gentle cleanser with ceramides"),
            sample("Moisturizing Cream", "moisturizer", "Rich cream for dry skin"),
            sample("Foaming Cleanser", "cleanser", "Removes OIL and dirt"),
            sample("Eye Repair", "moisturizer", "Reduces puffiness"),
        ]
    }

    fn names<'a>(view: &[&'a Product]) -> Vec<&'a str> {
        view.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn no_criteria_returns_everything_in_order() {
        let products = catalog();
        let view = filtered_view(&products, &FilterState::default());
        assert_eq!(
            names(&view),
            ["Hydrating Cleanser", "Moisturizing Cream", "Foaming Cleanser", "Eye Repair"]
        );
    }

    #[test]
    fn category_only_is_exact() {
        let products = catalog();
        let view = filtered_view(&products, &FilterState::new(Some("cleanser"), ""));
        assert_eq!(names(&view), ["Hydrating Cleanser", "Foaming Cleanser"]);

        let view = filtered_view(&products, &FilterState::new(Some("Cleanser"), ""));
        assert!(view.is_empty());
    }

    #[test]
    fn keyword_matches_name_or_description_case_insensitively() {
        let products = catalog();
        let view = filtered_view(&products, &FilterState::new(None, "  Oil "));
        assert_eq!(names(&view), ["Foaming Cleanser"]);

        let view = filtered_view(&products, &FilterState::new(None, "CREAM"));
        assert_eq!(names(&view), ["Moisturizing Cream"]);
    }

    #[test]
    fn both_criteria_intersect() {
        let products = catalog();
        let view = filtered_view(&products, &FilterState::new(Some("moisturizer"), "puff"));
        assert_eq!(names(&view), ["Eye Repair"]);

        let view = filtered_view(&products, &FilterState::new(Some("cleanser"), "puff"));
        assert!(view.is_empty());
    }

    #[test]
    fn empty_category_counts_as_unset() {
        let filter = FilterState::new(Some(""), "");
        assert_eq!(filter.category(), None);
        assert_eq!(filtered_view(&catalog(), &filter).len(), 4);
    }

    #[test]
    fn view_is_sound_and_complete() {
        let products = catalog();
        for filter in [
            FilterState::default(),
            FilterState::new(Some("cleanser"), ""),
            FilterState::new(None, "re"),
            FilterState::new(Some("moisturizer"), "cream"),
        ] {
            let view = filtered_view(&products, &filter);
            for p in &products {
                let kept = view.iter().any(|v| v.name == p.name);
                assert_eq!(kept, filter.matches(p), "{} under {:?}", p.name, filter);
            }
        }
    }

    #[test]
    fn categories_are_distinct_in_first_seen_order() {
        assert_eq!(categories(&catalog()), ["cleanser", "moisturizer"]);
    }
}
