//! French translations

use std::collections::HashMap;

pub fn get_translations() -> HashMap<String, String> {
    let mut t = HashMap::new();

    // App general
    t.insert("app.title".into(), "Facturation \u{00C9}lectricit\u{00E9}".into());
    t.insert("app.version".into(), "Version".into());

    // Categories
    t.insert("category.residential".into(), "R\u{00E9}sidentiel".into());
    t.insert("category.commercial".into(), "Commercial".into());
    t.insert("category.industrial".into(), "Industriel".into());
    t.insert("category.agricultural".into(), "Agricole".into());

    // Bill breakdown
    t.insert("bill.title".into(), "Facture".into());
    t.insert("bill.account".into(), "Compte".into());
    t.insert("bill.billing_date".into(), "Date de facturation".into());
    t.insert("bill.units_consumed".into(), "Unit\u{00E9}s consomm\u{00E9}es".into());
    t.insert("bill.slab".into(), "Tranche".into());
    t.insert("bill.units".into(), "Unit\u{00E9}s".into());
    t.insert("bill.rate".into(), "Tarif".into());
    t.insert("bill.amount".into(), "Montant".into());
    t.insert("bill.base_amount".into(), "Consommation".into());
    t.insert("bill.fixed_charges".into(), "Abonnement".into());
    t.insert("bill.electricity_duty".into(), "Taxe sur l'\u{00E9}lectricit\u{00E9}".into());
    t.insert("bill.gst_amount".into(), "TVA".into());
    t.insert("bill.total_amount".into(), "Montant total".into());
    t.insert("bill.preview".into(), "Aper\u{00E7}u (non \u{00E9}mis)".into());

    // Time of use
    t.insert("tou.peak".into(), "Heures pleines".into());
    t.insert("tou.normal".into(), "Heures normales".into());
    t.insert("tou.off_peak".into(), "Heures creuses".into());

    // Tariffs
    t.insert("tariff.title".into(), "Tarif".into());
    t.insert("tariff.effective_date".into(), "Date d'effet".into());
    t.insert("tariff.valid_until".into(), "Valable jusqu'au".into());
    t.insert("tariff.active".into(), "En vigueur".into());
    t.insert("tariff.fixed_charge".into(), "Abonnement".into());
    t.insert("tariff.electricity_duty_percent".into(), "Taxe sur l'\u{00E9}lectricit\u{00E9} (%)".into());
    t.insert("tariff.gst_percent".into(), "TVA (%)".into());
    t.insert("tariff.published".into(), "Tarif publi\u{00E9}".into());

    // Errors
    t.insert("error.invalid_input".into(), "Veuillez v\u{00E9}rifier les valeurs saisies".into());
    t.insert("error.tariff_configuration".into(), "Le tarif est mal configur\u{00E9} et doit \u{00EA}tre corrig\u{00E9} par un administrateur".into());
    t.insert("error.not_found".into(), "Aucune donn\u{00E9}e trouv\u{00E9}e".into());
    t.insert("error.internal".into(), "Une erreur est survenue".into());

    t
}
