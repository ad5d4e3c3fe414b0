//! Compact position reporting, global airborne decode.
//!
//! An even and an odd encoded position, each 17 bits of latitude and longitude,
//! pin down one fix when combined. The result takes the latitude zone of
//! whichever half arrived last.

/// Latitudes at which the number of longitude zones drops by one, starting from 59 at the equator.
const NL_TRANSITIONS: [f64; 58] = [
    10.47047130, 14.82817437, 18.18626357, 21.02939493,
    23.54504487, 25.82924707, 27.93898710, 29.91135686,
    31.77209708, 33.53993436, 35.22899598, 36.85025108,
    38.41241892, 39.92256684, 41.38651832, 42.80914012,
    44.19454951, 45.54626723, 46.86733252, 48.16039128,
    49.42776439, 50.67150166, 51.89342469, 53.09516153,
    54.27817472, 55.44378444, 56.59318756, 57.72747354,
    58.84763776, 59.95459277, 61.04917774, 62.13216659,
    63.20427479, 64.26616523, 65.31845310, 66.36171008,
    67.39646774, 68.42322022, 69.44242631, 70.45451075,
    71.45986473, 72.45884545, 73.45177442, 74.43893416,
    75.42056257, 76.39684391, 77.36789461, 78.33374083,
    79.29428225, 80.24923213, 81.19801349, 82.13956981,
    83.07199445, 83.99173563, 84.89166191, 85.75541621,
    86.53536998, 87.00000000,
];

const CPR_SCALE: f64 = 131072.0;
const AIR_DLAT_EVEN: f64 = 360.0 / 60.0;
const AIR_DLAT_ODD: f64 = 360.0 / 59.0;

/// Number of longitude zones at `lat`. Symmetric about the equator.
pub fn nl(lat: f64) -> u32 {
    let lat = lat.abs();
    let passed = NL_TRANSITIONS.iter().take_while(|t| lat >= **t).count();
    59 - passed as u32
}

/// Modulo that never returns a negative value.
fn modulo(a: f64, b: f64) -> f64 {
    let res = a % b;
    if res < 0.0 { res + b } else { res }
}

/// Longitude zone count for a half of parity `odd` at `lat`, at least one.
fn n(lat: f64, odd: bool) -> f64 {
    let zones = nl(lat) as f64 - if odd { 1.0 } else { 0.0 };
    zones.max(1.0)
}

/// A single encoded half: raw latitude, raw longitude, arrival time in seconds.
pub type CprHalf = (u32, u32, f64);

/// Returns latitude and longitude in degrees or None when the halves straddle
/// a latitude zone boundary.
pub fn decode_cpr(even: CprHalf, odd: CprHalf) -> Option<(f64, f64)> {
    let lat0 = even.0 as f64;
    let lat1 = odd.0 as f64;
    let lon0 = even.1 as f64;
    let lon1 = odd.1 as f64;

    let j = ((59.0 * lat0 - 60.0 * lat1) / CPR_SCALE + 0.5).floor();
    let mut rlat0 = AIR_DLAT_EVEN * (modulo(j, 60.0) + lat0 / CPR_SCALE);
    let mut rlat1 = AIR_DLAT_ODD * (modulo(j, 59.0) + lat1 / CPR_SCALE);

    if rlat0 >= 270.0 {
        rlat0 -= 360.0;
    }
    if rlat1 >= 270.0 {
        rlat1 -= 360.0;
    }

    if nl(rlat0) != nl(rlat1) {
        return None;
    }

    let use_even = even.2 > odd.2;
    let (lat, own_lon, odd_flag) = if use_even {
        (rlat0, lon0, false)
    } else {
        (rlat1, lon1, true)
    };

    let zones = nl(lat) as f64;
    let ni = n(lat, odd_flag);
    let m = ((lon0 * (zones - 1.0) - lon1 * zones) / CPR_SCALE + 0.5).floor();
    let mut lon = (360.0 / ni) * (modulo(m, ni) + own_lon / CPR_SCALE);
    if lon > 180.0 {
        lon -= 360.0;
    }

    Some((lat, lon))
}
