//! Grocery categories, name-based category guessing and default shelf life.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Produce,
    Dairy,
    Meat,
    Seafood,
    Bakery,
    Grains,
    Frozen,
    Beverages,
    Snacks,
    Condiments,
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Produce,
        Category::Dairy,
        Category::Meat,
        Category::Seafood,
        Category::Bakery,
        Category::Grains,
        Category::Frozen,
        Category::Beverages,
        Category::Snacks,
        Category::Condiments,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "produce",
            Category::Dairy => "dairy",
            Category::Meat => "meat",
            Category::Seafood => "seafood",
            Category::Bakery => "bakery",
            Category::Grains => "grains",
            Category::Frozen => "frozen",
            Category::Beverages => "beverages",
            Category::Snacks => "snacks",
            Category::Condiments => "condiments",
            Category::Other => "other",
        }
    }

    /// Lenient parse; accepts the aliases the dashboard and receipt scans emit
    /// (`fruits`, `vegetables`, `fish`, ...).
    pub fn parse(s: &str) -> Option<Category> {
        let c = match s.trim().to_ascii_lowercase().as_str() {
            "produce" | "fruit" | "fruits" | "vegetable" | "vegetables" => Category::Produce,
            "dairy" => Category::Dairy,
            "meat" | "poultry" | "proteins" => Category::Meat,
            "seafood" | "fish" => Category::Seafood,
            "bakery" | "bread" => Category::Bakery,
            "grains" | "pantry" | "dry goods" => Category::Grains,
            "frozen" => Category::Frozen,
            "beverages" | "drinks" => Category::Beverages,
            "snacks" => Category::Snacks,
            "condiments" | "spices" | "sauces" => Category::Condiments,
            "other" => Category::Other,
            _ => return None,
        };
        Some(c)
    }

    /// Days an item of this category typically keeps after purchase.
    pub fn shelf_life_days(&self) -> i64 {
        match self {
            Category::Produce => 7,
            Category::Dairy => 10,
            Category::Meat => 4,
            Category::Seafood => 2,
            Category::Bakery => 5,
            Category::Grains => 180,
            Category::Frozen => 90,
            Category::Beverages => 180,
            Category::Snacks => 120,
            Category::Condiments => 365,
            Category::Other => 30,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Order matters: "ice cream" must hit frozen before dairy sees "cream",
// "fish sauce" and "peanut butter" must hit condiments before seafood and dairy.
static RULES: Lazy<Vec<(Regex, Category)>> = Lazy::new(|| {
    let table: [(&str, Category); 10] = [
        (r"\b(frozen|ice cream|popsicle|frozen pizza)\b", Category::Frozen),
        (r"\b(ketchup|mustard|mayo(nnaise)?|sauce|vinegar|oil|salt|black pepper|peppercorns?|pepper flakes|spices?|honey|jam|syrup|dressing|(peanut|almond|cashew) butter)\b", Category::Condiments),
        (r"\b(milk|cheese|yog(h)?urt|butter|cream|eggs?|feta|mozzarella|cheddar)\b", Category::Dairy),
        (r"\b(chicken|beef|pork|turkey|lamb|bacon|ham|sausages?|steak|mince|ground beef)\b", Category::Meat),
        (r"\b(fish|salmon|tuna|shrimps?|prawns?|cod|crab|lobster|tilapia)\b", Category::Seafood),
        (r"\b(bread|bagels?|muffins?|croissants?|buns?|rolls?|tortillas?|baguette)\b", Category::Bakery),
        (r"\b(rice|pasta|quinoa|oats|cereal|flour|noodles?|spaghetti|beans|lentils)\b", Category::Grains),
        (r"\b(water|juice|soda|coffee|tea|beer|wine|cola|lemonade)\b", Category::Beverages),
        (r"\b(chips|crackers|cookies?|chocolate|candy|popcorn|pretzels?|nuts|almonds?)\b", Category::Snacks),
        (r"\b(apples?|bananas?|oranges?|grapes?|berr(y|ies)|strawberr(y|ies)|blueberr(y|ies)|lemons?|limes?|avocados?|tomato(es)?|potato(es)?|onions?|garlic|carrots?|lettuce|spinach|broccoli|cucumbers?|peppers?|celery|kale|mushrooms?|peach(es)?|pears?|mango(es)?|pineapples?|zucchini|cabbage|corn)\b", Category::Produce),
    ];
    table
        .into_iter()
        .map(|(pat, cat)| (Regex::new(&format!("(?i){pat}")).expect("category regex"), cat))
        .collect()
});

/// Guess a category from a free-text product name. Unknown names map to `Other`.
pub fn guess_category(name: &str) -> Category {
    RULES
        .iter()
        .find(|(re, _)| re.is_match(name))
        .map(|(_, cat)| *cat)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_common_groceries() {
        assert_eq!(guess_category("Bananas"), Category::Produce);
        assert_eq!(guess_category("Milk 1% Gallon"), Category::Dairy);
        assert_eq!(guess_category("Eggs Large Dozen"), Category::Dairy);
        assert_eq!(guess_category("Chicken Breast"), Category::Meat);
        assert_eq!(guess_category("Atlantic Salmon Fillet"), Category::Seafood);
        assert_eq!(guess_category("Bread Whole Wheat"), Category::Bakery);
        assert_eq!(guess_category("Basmati Rice"), Category::Grains);
        assert_eq!(guess_category("Orange Juice"), Category::Beverages);
        assert_eq!(guess_category("Tortilla Chips"), Category::Snacks);
        assert_eq!(guess_category("Mystery Box"), Category::Other);
    }

    #[test]
    fn ordering_resolves_overlaps() {
        assert_eq!(guess_category("Vanilla Ice Cream"), Category::Frozen);
        assert_eq!(guess_category("Fish Sauce"), Category::Condiments);
        assert_eq!(guess_category("Peanut Butter"), Category::Condiments);
        assert_eq!(guess_category("Salted Butter"), Category::Dairy);
        assert_eq!(guess_category("Red Bell Pepper"), Category::Produce);
        assert_eq!(guess_category("Ground Black Pepper"), Category::Condiments);
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(Category::parse("Vegetables"), Some(Category::Produce));
        assert_eq!(Category::parse("fish"), Some(Category::Seafood));
        assert_eq!(Category::parse("nope"), None);
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
    }
}
