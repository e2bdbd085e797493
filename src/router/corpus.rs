// Utterance corpus
//
// Labeled example sentences that define each route's meaning for the
// semantic classifier. Growing this list is how semantic recall improves.

use super::decision::Route;

/// One labeled example sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtteranceExample {
    pub route: Route,
    pub text: &'static str,
}

const FAQ_UTTERANCES: &[&str] = &[
    "What is the return policy of the products?",
    "Do I get discount with the HDFC credit card?",
    "How can I track my order?",
    "What payment methods are accepted?",
    "How long does it take to process a refund?",
    "What are the delivery charges?",
    "When will my order be delivered?",
    "Do you offer no-cost EMI?",
    "Is installation available for appliances?",
    "Can I exchange a product if the size is wrong?",
    "How do I claim warranty for a product?",
    "What is Flipkart Plus?",
    "Do you have Buy Now Pay Later?",
    "How can I download my invoice?",
    "Are gift cards available?",
    "How do I report a damaged or counterfeit product?",
    "Is Cash on Delivery available at my pincode?",
    "Do you provide open-box delivery?",
    "Do you ship internationally?",
    "How do I apply a promo code?",
    "What is your policy on defective product?",
];

const PRODUCT_SEARCH_UTTERANCES: &[&str] = &[
    "I want to buy nike shoes that have 50% discount.",
    "Are there any shoes under Rs. 3000?",
    "Do you have formal shoes in size 9?",
    "Are there any Puma shoes on sale?",
    "What is the price of puma running shoes?",
    "Show me adidas sneakers below 2500 with rating above 4.",
    "Top 5 nike running shoes by rating",
    "Shoes with discount more than 30 percent",
    "Women's running shoes under 2000",
    "Black formal shoes size 8",
    "Sort sports shoes by highest rating",
    "Bestselling shoes with more than 500 ratings",
    "Reebok shoes between 2000 and 4000",
    "Kids shoes with rating over 4.2",
    "Show 3 Puma shoes with highest discount",
    "Pink Puma shoes in price range 1000 to 5000",
];

const SMALL_TALK_UTTERANCES: &[&str] = &[
    "How are you?",
    "What is your name?",
    "Are you a robot?",
    "What are you?",
    "What do you do?",
    "Hi",
    "Hello",
    "Hey there",
    "Who made you?",
    "Tell me about yourself",
    "What can you do?",
    "Can you help me?",
    "Thanks",
    "Thank you",
    "Bye",
    "Goodbye",
    "Are you human?",
];

/// Read-only set of labeled utterances.
#[derive(Debug, Clone)]
pub struct Corpus {
    examples: Vec<UtteranceExample>,
}

impl Corpus {
    /// The retail assistant's built-in corpus.
    pub fn builtin() -> Self {
        let sources = [
            (Route::Faq, FAQ_UTTERANCES),
            (Route::ProductSearch, PRODUCT_SEARCH_UTTERANCES),
            (Route::SmallTalk, SMALL_TALK_UTTERANCES),
        ];

        let examples = sources
            .iter()
            .flat_map(|(route, texts)| {
                texts.iter().map(move |text| UtteranceExample {
                    route: *route,
                    text: *text,
                })
            })
            .collect();

        Self { examples }
    }

    /// Build a corpus from arbitrary examples. Routes may be left empty;
    /// the semantic classifier never selects a route without examples.
    pub fn from_examples(examples: Vec<UtteranceExample>) -> Self {
        Self { examples }
    }

    pub fn examples(&self) -> &[UtteranceExample] {
        &self.examples
    }

    pub fn examples_for(&self, route: Route) -> impl Iterator<Item = &UtteranceExample> {
        self.examples.iter().filter(move |e| e.route == route)
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Self-test probes: the first utterance of every route that has one.
    /// Each probe must classify back to its own route.
    pub fn probes(&self) -> Vec<UtteranceExample> {
        Route::PRIORITY
            .iter()
            .filter_map(|route| self.examples_for(*route).next().copied())
            .collect()
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::builtin()
    }
}
