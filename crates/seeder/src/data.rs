//! Demo data set: a handful of users and properties spanning property types,
//! locations, ROI bands and token availability, plus a few appreciated
//! holdings so the recommendation and portfolio surfaces have something to
//! work with out of the box.

#[derive(Debug, Clone)]
pub struct SeedUser {
    pub username: &'static str,
    pub email: &'static str,
    pub wallet_address: Option<&'static str>,
    pub kyc_status: &'static str,
}

#[derive(Debug, Clone)]
pub struct SeedProperty {
    pub title: &'static str,
    pub description: &'static str,
    pub location: &'static str,
    pub property_type: &'static str,
    pub total_value: f64,
    pub total_tokens: i32,
    pub available_tokens: i32,
    pub expected_roi: f64,
    pub min_investment: f64,
    pub image_url: &'static str,
}

/// Indexes reference `sample_users()` / `sample_properties()` positions.
#[derive(Debug, Clone)]
pub struct SeedInvestment {
    pub user_idx: usize,
    pub property_idx: usize,
    pub tokens_owned: i32,
    pub investment_amount: f64,
    pub current_value: f64,
}

pub fn sample_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            username: "john_investor",
            email: "john@example.com",
            wallet_address: Some("rrkah-fqaaa-aaaah-qcdaq-cai"),
            kyc_status: "verified",
        },
        SeedUser {
            username: "mary_trader",
            email: "mary@example.com",
            wallet_address: Some("rdmx6-jaaaa-aaaah-qazqq-cai"),
            kyc_status: "verified",
        },
        SeedUser {
            username: "alex_crypto",
            email: "alex@example.com",
            wallet_address: Some("ryjl3-tyaaa-aaaah-qazsa-cai"),
            kyc_status: "pending",
        },
    ]
}

pub fn sample_properties() -> Vec<SeedProperty> {
    vec![
        SeedProperty {
            title: "Manhattan Luxury Residences",
            description: "Premium apartment complex in the heart of Manhattan with high-end amenities.",
            location: "New York, NY",
            property_type: "Residential",
            total_value: 4_200_000.0,
            total_tokens: 4200,
            available_tokens: 2840,
            expected_roi: 14.2,
            min_investment: 1000.0,
            image_url: "https://images.unsplash.com/photo-1545324418-cc1a3fa10c00?w=400",
        },
        SeedProperty {
            title: "Silicon Valley Tech Campus",
            description: "Modern office complex in the heart of Silicon Valley tech district.",
            location: "Palo Alto, CA",
            property_type: "Commercial",
            total_value: 8_500_000.0,
            total_tokens: 8500,
            available_tokens: 3400,
            expected_roi: 12.8,
            min_investment: 2500.0,
            image_url: "https://images.unsplash.com/photo-1486406146926-c627a92ad1ab?w=400",
        },
        SeedProperty {
            title: "Miami Beach Resort",
            description: "Luxury beachfront resort with premium amenities and ocean views.",
            location: "Miami Beach, FL",
            property_type: "Hospitality",
            total_value: 12_000_000.0,
            total_tokens: 12000,
            available_tokens: 7200,
            expected_roi: 16.5,
            min_investment: 5000.0,
            image_url: "https://images.unsplash.com/photo-1571003123894-1f0594d2b5d9?w=400",
        },
        SeedProperty {
            title: "Austin Mixed-Use Development",
            description: "Mixed-use development combining retail, office, and residential spaces.",
            location: "Austin, TX",
            property_type: "Mixed-Use",
            total_value: 6_800_000.0,
            total_tokens: 6800,
            available_tokens: 4760,
            expected_roi: 13.7,
            min_investment: 1500.0,
            image_url: "https://images.unsplash.com/photo-1545558014-8692077e9b5c?w=400",
        },
        SeedProperty {
            title: "Chicago Industrial Complex",
            description: "Large-scale industrial complex with modern logistics facilities.",
            location: "Chicago, IL",
            property_type: "Industrial",
            total_value: 5_400_000.0,
            total_tokens: 5400,
            available_tokens: 2160,
            expected_roi: 11.3,
            min_investment: 3000.0,
            image_url: "https://images.unsplash.com/photo-1581091226825-a6a2a5aee158?w=400",
        },
        SeedProperty {
            title: "Seattle Waterfront Towers",
            description: "Twin towers with stunning waterfront views and premium finishes.",
            location: "Seattle, WA",
            property_type: "Residential",
            total_value: 9_200_000.0,
            total_tokens: 9200,
            available_tokens: 5520,
            expected_roi: 15.1,
            min_investment: 2000.0,
            image_url: "https://images.unsplash.com/photo-1555636222-cae831e670b3?w=400",
        },
    ]
}

pub fn sample_investments() -> Vec<SeedInvestment> {
    vec![
        SeedInvestment {
            user_idx: 0,
            property_idx: 0,
            tokens_owned: 50,
            investment_amount: 50_000.0,
            current_value: 52_500.0,
        },
        SeedInvestment {
            user_idx: 0,
            property_idx: 1,
            tokens_owned: 25,
            investment_amount: 62_500.0,
            current_value: 65_000.0,
        },
        SeedInvestment {
            user_idx: 1,
            property_idx: 0,
            tokens_owned: 75,
            investment_amount: 75_000.0,
            current_value: 78_750.0,
        },
        SeedInvestment {
            user_idx: 1,
            property_idx: 2,
            tokens_owned: 30,
            investment_amount: 30_000.0,
            current_value: 31_200.0,
        },
    ]
}
