use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub company: Company,
    #[serde(default)]
    pub assets: AssetSettings,
    #[serde(default)]
    pub pdf: PdfSettings,
}

/// Office identity printed in the header band, seller block and footer.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Company {
    pub name: String,
    pub name_ar: String,
    pub seller_name: String,
    pub tagline: String,
    pub address: String,
    pub address_ar: String,
    pub contact: String,
    pub contact_ar: String,
    pub email: String,
    pub website: String,
    pub copyright: String,
    pub bar_text: String,
}

impl Default for Company {
    fn default() -> Self {
        Self {
            name: "EL HEKMA ENGINEERING OFFICE".to_string(),
            name_ar: "مكتب الحكمة الهندسي".to_string(),
            seller_name: "EL HEKMA Engineering Office".to_string(),
            tagline: "Professional Engineering Solutions".to_string(),
            address: "41 Al-Mawardi Street, Al-Qasr Al-Aini, Cairo, Egypt".to_string(),
            address_ar: "العنوان: ٤١ شارع الماوردي، القصر العيني، القاهرة، مصر".to_string(),
            contact: "Tel: +20 11 47304880 | Fax: +2027932115".to_string(),
            contact_ar: "تليفون: ٢٠ ١١ ٤٧٣٠٤٨٨٠+ | فاكس: ٢٠٢٧٩٣٢١١٥+".to_string(),
            email: "el_hekma2013@yahoo.com".to_string(),
            website: "https://heomed.com/".to_string(),
            copyright: "© 2024 EL HEKMA Engineering Office. All rights reserved.".to_string(),
            bar_text: "HEKMA ENGINEERING OFFICE - Professional Solutions".to_string(),
        }
    }
}

/// Static assets. Each entry is a filesystem path or an http(s) URL.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AssetSettings {
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PdfSettings {
    pub output_dir: String,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/.hekma-invoice/output".to_string(),
        }
    }
}
